use thiserror::Error;

#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("store unavailable: {0}")]
    Store(#[from] pitchline_store::StoreError),
}

pub type Result<T> = std::result::Result<T, LimiterError>;
