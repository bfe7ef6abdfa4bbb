//! # File Descriptor Repository
//!
//! One JSON document per tenant under a root directory:
//!
//! ```text
//! <root>/
//!   alpha.json
//!   beta.json
//! ```
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a half-written document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared_types::{validate_tenant_name, ShellDescriptor};
use tracing::debug;

use crate::domain::errors::RepositoryError;
use crate::ports::outbound::DescriptorRepository;

/// Descriptor repository backed by the local filesystem.
pub struct FileDescriptorRepository {
    root: PathBuf,
}

impl FileDescriptorRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, tenant: &str) -> Result<PathBuf, RepositoryError> {
        validate_tenant_name(tenant).map_err(|e| RepositoryError::Io(e.to_string()))?;
        Ok(self.root.join(format!("{tenant}.json")))
    }
}

#[async_trait]
impl DescriptorRepository for FileDescriptorRepository {
    async fn get_descriptor(&self, tenant: &str) -> Result<Option<ShellDescriptor>, RepositoryError> {
        let path = self.path_for(tenant)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepositoryError::Io(format!("{}: {e}", path.display()))),
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| RepositoryError::Serialization(format!("{}: {e}", path.display())))
    }

    async fn save_descriptor(
        &self,
        tenant: &str,
        descriptor: &ShellDescriptor,
    ) -> Result<(), RepositoryError> {
        let path = self.path_for(tenant)?;
        let json = serde_json::to_vec_pretty(descriptor)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| RepositoryError::Io(format!("{}: {e}", self.root.display())))?;

        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, &json)
            .await
            .map_err(|e| RepositoryError::Io(format!("{}: {e}", staging.display())))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| RepositoryError::Io(format!("{}: {e}", path.display())))?;

        debug!(tenant, serial = descriptor.serial_number, path = %path.display(), "Descriptor written");
        Ok(())
    }
}
