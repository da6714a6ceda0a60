use thiserror::Error;

/// Crate-wide error type for concerns shared across every component
/// (configuration, identity derivation, store transport failures surfaced
/// generically). Component-specific failure modes live in their own crate
/// (`StoreError`, `LimiterError`, `CacheError`, ...) and convert into this
/// one at the gateway boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short machine-readable code surfaced in client-facing error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::AuthFailed(_) => "AUTH_FAILED",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Serialization(_) => "SERIALIZATION_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
