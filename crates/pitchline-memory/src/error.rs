use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("store unavailable: {0}")]
    Store(#[from] pitchline_store::StoreError),

    #[error("malformed conversation buffer: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
