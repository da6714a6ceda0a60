use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Locked(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
