//! # Domain Errors
//!
//! Build and usage errors for shells.

use thiserror::Error;
use ts_01_descriptor_store::StoreError;

/// Errors raised while composing or constructing a shell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The descriptor could not be turned into a blueprint.
    #[error("Composition failed for tenant '{tenant}': {reason}")]
    Composition { tenant: String, reason: String },

    /// A feature module failed while populating the container.
    #[error("Container construction failed for tenant '{tenant}': {reason}")]
    Container { tenant: String, reason: String },

    /// A service the build depends on was not registered.
    #[error("Service {service} is not registered in the shell of tenant '{tenant}'")]
    MissingService {
        tenant: String,
        service: &'static str,
    },

    /// Reading the persisted descriptor failed.
    #[error("Descriptor store error: {0}")]
    Store(#[from] StoreError),

    /// The build did not finish within the configured budget.
    #[error("Building tenant '{tenant}' timed out after {seconds}s")]
    TimedOut { tenant: String, seconds: u64 },

    /// Unrecoverable condition; aborts every build in progress.
    #[error("Fatal error while building tenant '{tenant}': {reason}")]
    Fatal { tenant: String, reason: String },
}

impl BuildError {
    /// Fatal errors abort the whole startup pass instead of one tenant.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

/// Errors raised when using a shell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// The shell was disposed and its container released.
    #[error("Shell of tenant '{tenant}' has been disposed")]
    Disposed { tenant: String },

    /// The requested service is not part of this shell.
    #[error("Service {service} is not registered in the shell of tenant '{tenant}'")]
    MissingService {
        tenant: String,
        service: &'static str,
    },
}

impl From<ShellError> for BuildError {
    fn from(err: ShellError) -> Self {
        match err {
            ShellError::Disposed { tenant } => BuildError::Container {
                tenant,
                reason: "shell disposed during build".to_string(),
            },
            ShellError::MissingService { tenant, service } => {
                BuildError::MissingService { tenant, service }
            }
        }
    }
}
