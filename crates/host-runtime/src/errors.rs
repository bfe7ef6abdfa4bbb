//! # Host Errors

use shared_types::TenantError;
use thiserror::Error;
use ts_01_descriptor_store::StoreError;
use ts_02_shell_builder::{BuildError, ShellError};

/// Errors from reading or writing tenant settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(String),

    #[error("Settings document is malformed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Tenant(#[from] TenantError),
}

/// Errors raised by recipe execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    #[error("Recipe '{recipe}' failed at step '{step}': {reason}")]
    StepFailed {
        recipe: String,
        step: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by the shell host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// No shell is registered for the tenant.
    #[error("No shell registered for tenant '{tenant}'")]
    NotFound { tenant: String },

    /// One tenant's shell could not be built.
    #[error("Tenant '{tenant}' could not be built: {source}")]
    TenantBuildFailure {
        tenant: String,
        #[source]
        source: BuildError,
    },

    /// Unrecoverable condition that aborts the whole build pass.
    #[error("Fatal error while building tenant '{tenant}': {reason}")]
    FatalProcessError { tenant: String, reason: String },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Setup of tenant '{tenant}' failed: {reason}")]
    Setup { tenant: String, reason: String },
}

impl HostError {
    /// Classify a build error of `tenant`.
    pub fn from_build(tenant: &str, err: BuildError) -> Self {
        if err.is_fatal() {
            HostError::FatalProcessError {
                tenant: tenant.to_string(),
                reason: err.to_string(),
            }
        } else {
            HostError::TenantBuildFailure {
                tenant: tenant.to_string(),
                source: err,
            }
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, HostError::FatalProcessError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_build_errors_are_classified() {
        let fatal = HostError::from_build(
            "alpha",
            BuildError::Fatal {
                tenant: "alpha".into(),
                reason: "out of memory".into(),
            },
        );
        assert!(fatal.is_fatal());

        let failure = HostError::from_build(
            "alpha",
            BuildError::Composition {
                tenant: "alpha".into(),
                reason: "unknown feature 'blog'".into(),
            },
        );
        assert!(matches!(failure, HostError::TenantBuildFailure { ref tenant, .. } if tenant == "alpha"));
    }
}
