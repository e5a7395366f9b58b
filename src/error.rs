//! Error types shared by the store, fetch, and projection layers.

use std::time::Duration;
use thiserror::Error;

/// Process exit code for invalid input (bad path, nothing selected, bad config).
pub const EXIT_VALIDATION: i32 = 1;
/// Process exit code for failures talking to the store.
pub const EXIT_STORE: i32 = 3;

/// Input rejected before any store call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid path: '{0}' - only path hierarchies are supported (e.g. '/production/webapp/')")]
    FlatPath(String),

    #[error("Invalid tag: tag keys must not be empty")]
    EmptyTag,

    #[error("At least one of --paths or --tags must be specified")]
    NothingSelected,
}

/// Errors reported by a [`crate::store::ParameterStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Transient throttling; the only class the retry wrapper retries.
    #[error("rate limited by parameter store: {0}")]
    RateLimited(String),

    #[error("parameter not found: {0}")]
    NotFound(String),

    #[error("invalid parameters: {}", .0.join(", "))]
    InvalidParameters(Vec<String>),

    #[error("parameter store request failed: {0}")]
    Other(String),
}

impl StoreError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StoreError::RateLimited(_))
    }
}

/// Top-level library error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("timed out after {timeout:?} waiting for parameter store")]
    DeadlineExceeded { timeout: Duration },

    #[error("parameters '{first}' and '{second}' both map to variable {name}")]
    NameCollision { name: String, first: String, second: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::Config(_) => EXIT_VALIDATION,
            Error::Store(_) | Error::DeadlineExceeded { .. } | Error::NameCollision { .. } => {
                EXIT_STORE
            }
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameters_message_names_every_parameter() {
        let err = StoreError::InvalidParameters(vec!["/a/X".into(), "/b/Y".into()]);
        assert_eq!(err.to_string(), "invalid parameters: /a/X, /b/Y");
    }

    #[test]
    fn exit_codes_split_validation_from_store_failures() {
        assert_eq!(Error::from(ValidationError::NothingSelected).exit_code(), EXIT_VALIDATION);
        assert_eq!(Error::from(StoreError::Other("boom".into())).exit_code(), EXIT_STORE);
        let deadline = Error::DeadlineExceeded { timeout: Duration::from_secs(1) };
        assert_eq!(deadline.exit_code(), EXIT_STORE);
    }

    #[test]
    fn only_throttling_is_rate_limited() {
        assert!(StoreError::RateLimited("slow down".into()).is_rate_limited());
        assert!(!StoreError::NotFound("/a".into()).is_rate_limited());
    }
}
