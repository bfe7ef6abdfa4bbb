//! # Inbound Port
//!
//! Shell construction API.

use async_trait::async_trait;
use shared_types::{ShellDescriptor, ShellSettings};

use crate::domain::errors::BuildError;
use crate::shell::ShellContext;

/// Builds shells. A failed build never yields a partially built shell.
#[async_trait]
pub trait ShellContextFactory: Send + Sync {
    /// Two-phase build: resolve the persisted descriptor through a reduced
    /// bootstrap shell, then rebuild from it when it is newer.
    async fn create_shell_context(&self, settings: &ShellSettings) -> Result<ShellContext, BuildError>;

    /// Single-phase build from a known descriptor.
    fn create_described_context(
        &self,
        settings: &ShellSettings,
        descriptor: &ShellDescriptor,
    ) -> Result<ShellContext, BuildError>;

    /// Shell used to run first-time setup when no tenant exists yet.
    fn create_setup_context(&self, settings: &ShellSettings) -> Result<ShellContext, BuildError> {
        self.create_described_context(settings, &ShellDescriptor::setup())
    }
}
