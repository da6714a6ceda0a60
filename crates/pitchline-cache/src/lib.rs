pub mod cache;
pub mod classify;
pub mod error;
pub mod types;

pub use cache::ResponseCache;
pub use classify::{classify, Category};
pub use error::{CacheError, Result};
pub use types::{CacheRecord, CacheStatistics, CacheStatsSnapshot};
