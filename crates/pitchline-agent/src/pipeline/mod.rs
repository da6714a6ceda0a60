//! Orchestration pipeline (C7) — classify, consult the cache, run the tool
//! loop, persist to conversation memory, write through to the cache.

pub mod process;

pub use process::{process_message, OrchestratorEvent, ProcessedMessage};
