use thiserror::Error;

/// Errors that can occur within the vector-ingestion subsystem.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON (de)serialisation failure.
    #[error("serialisation error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Transport failure talking to the embedding or vector-index provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No article with the given id exists.
    #[error("article not found: {id}")]
    ArticleNotFound { id: i64 },

    /// The article is already mid-ingestion; a concurrent worker owns it.
    #[error("article {id} is already processing")]
    AlreadyProcessing { id: i64 },

    /// The embedding provider returned an error after exhausting retries.
    #[error("embedding failed for article {id}: {reason}")]
    EmbeddingFailed { id: i64, reason: String },

    /// The vector index rejected the upsert.
    #[error("vector upsert failed for article {id}: {reason}")]
    VectorUpsertFailed { id: i64, reason: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
