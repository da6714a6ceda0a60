use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("unknown ranking strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid clickbait pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, RankError>;
