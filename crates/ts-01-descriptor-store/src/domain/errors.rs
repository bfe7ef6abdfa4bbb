//! # Domain Errors
//!
//! Error types for the Descriptor Store.

use thiserror::Error;

/// Errors raised by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// I/O failure in the backend.
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// Stored document could not be decoded or encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors returned by the Descriptor Store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The caller's prior serial number is stale. Never retried automatically.
    #[error("Concurrency conflict for tenant '{tenant}': expected serial {expected}, stored serial is {actual}")]
    ConcurrencyConflict {
        tenant: String,
        expected: i64,
        actual: i64,
    },

    /// The stored serial number cannot be incremented.
    #[error("Serial number of tenant '{tenant}' is exhausted at {serial}")]
    SerialExhausted { tenant: String, serial: i64 },

    /// The persistence round-trip failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The operation was cancelled before it completed.
    #[error("Descriptor operation cancelled")]
    Cancelled,
}
