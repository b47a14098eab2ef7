//! Error types for `dcbstore`.
//!
//! The taxonomy distinguishes caller-recoverable conflicts from storage
//! failures and plain caller bugs:
//!
//! - **Integrity**: the append's consistency boundary was violated, or an
//!   idempotent retry was ambiguous. The caller re-reads state and retries
//!   with a fresh condition. The engine never retries these internally -
//!   an automatic retry would defeat the conflict signal.
//! - **InvalidArgument**: malformed request; fails fast with no effect.
//! - **Storage** / **Corruption** / **Io**: the underlying persistence
//!   failed; the store must be treated as suspect until verified.

use thiserror::Error;

/// Errors surfaced by event store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The append condition's query matched a committed event after the
    /// reference position, or an idempotent retry was ambiguous.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The request itself was malformed; nothing was evaluated or mutated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying storage failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Stored state violated an internal invariant.
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for event store results.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = StoreError::Integrity("condition matched event at position 4".to_string());
        assert_eq!(
            err.to_string(),
            "integrity error: condition matched event at position 4"
        );

        let err = StoreError::InvalidArgument("subscribe cannot read backwards".to_string());
        assert_eq!(
            err.to_string(),
            "invalid argument: subscribe cannot read backwards"
        );

        let err = StoreError::Storage("ledger lock poisoned".to_string());
        assert_eq!(err.to_string(), "storage failure: ledger lock poisoned");
    }

    #[test]
    fn io_errors_convert_into_store_errors() {
        use std::io::{Error as IoError, ErrorKind};

        let io_err = IoError::new(ErrorKind::NotFound, "segment missing");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
