//! Error types for the kbchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context (provider, store) has its own error enum; both are
//! folded into the small domain [`Error`] taxonomy before they leave the
//! session manager.

use thiserror::Error;

/// The domain error surfaced by chat operations.
///
/// The HTTP boundary maps each kind to exactly one status code:
/// `NotFound` → 404, `ModelGenerationFailure` → 502, everything else → 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Chat store is corrupted: {0}")]
    StorageCorrupted(String),

    #[error("Failed to persist chat store: {0}")]
    StoragePersistFailure(String),

    #[error("Model generation failed: {0}")]
    ModelGenerationFailure(#[source] ProviderError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short machine-readable name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::StorageCorrupted(_) => "storage_corrupted",
            Error::StoragePersistFailure(_) => "storage_persist_failure",
            Error::ModelGenerationFailure(_) => "model_generation_failure",
            Error::Config { .. } => "config",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Error::NotFound(id),
            StoreError::Corrupted { location, reason } => {
                Error::StorageCorrupted(format!("{location}: {reason}"))
            }
            StoreError::PersistFailure(reason) => Error::StoragePersistFailure(reason),
        }
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        Error::ModelGenerationFailure(err)
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider returned no text: {0}")]
    EmptyResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("No conversation with id {0}")]
    NotFound(String),

    #[error("Unreadable chat data at {location}: {reason}")]
    Corrupted { location: String, reason: String },

    #[error("Write failed: {0}")]
    PersistFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::ModelGenerationFailure(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
        assert_eq!(err.kind(), "model_generation_failure");
    }

    #[test]
    fn store_errors_fold_into_domain_kinds() {
        let not_found: Error = StoreError::NotFound("abc".into()).into();
        assert!(matches!(not_found, Error::NotFound(ref id) if id == "abc"));

        let corrupted: Error = StoreError::Corrupted {
            location: "chats.json".into(),
            reason: "expected value at line 1".into(),
        }
        .into();
        assert!(matches!(corrupted, Error::StorageCorrupted(_)));
        assert!(corrupted.to_string().contains("chats.json"));

        let persist: Error = StoreError::PersistFailure("disk full".into()).into();
        assert_eq!(persist.kind(), "storage_persist_failure");
    }

    #[test]
    fn provider_error_becomes_generation_failure() {
        let err: Error = ProviderError::Network("connection reset".into()).into();
        assert!(matches!(err, Error::ModelGenerationFailure(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
