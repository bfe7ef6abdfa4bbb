//! # Error Types
//!
//! Errors raised while validating tenant data.

use thiserror::Error;

/// Errors produced by tenant settings validation and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantError {
    /// Tenant names must be non-empty and usable as a storage key.
    #[error("Invalid tenant name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Unknown textual tenant state.
    #[error("Unknown tenant state: {0}")]
    UnknownState(String),
}
