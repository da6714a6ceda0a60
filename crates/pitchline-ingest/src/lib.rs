//! `pitchline-ingest` — keeps the external vector index in sync with
//! articles whose embedding status is `pending` or `failed`.
//!
//! # Overview
//!
//! [`db::ArticleStore`] owns the local slice of the article/player schema
//! this repo actually reads and writes. [`engine::IngestWorker`] polls it
//! on a fixed interval, embeds new or changed content via an
//! [`embedding::EmbeddingProvider`], scores sentiment locally, and upserts
//! to an external [`vector_index::VectorIndex`].
//!
//! | Step | Action |
//! |------|--------|
//! | 1 | Load the article; missing or soft-deleted rows are skipped |
//! | 2 | Hash `title\n\ncontent` |
//! | 3 | Same hash + already `completed` + vector id present → no-op |
//! | 4 | Mark `processing` |
//! | 5 | Request an embedding (retried with backoff on rate limit) |
//! | 6 | Score sentiment from a positive/negative lexicon |
//! | 7 | Upsert the vector with metadata |
//! | 8 | Persist the embedding result, mark `completed` |

pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod sentiment;
pub mod types;
pub mod vector_index;

pub use db::ArticleStore;
pub use embedding::{EmbeddingProvider, OpenAiEmbeddingProvider};
pub use engine::{IngestWorker, ProcessOutcome};
pub use error::{IngestError, Result};
pub use sentiment::calculate_sentiment;
pub use types::{Article, BatchStats, EmbeddingStatus, PlayerRow};
pub use vector_index::{HttpVectorIndex, VectorIndex, VectorMatch, VectorMetadata};
