//! # Outbound Ports (Driven Ports)
//!
//! Persistence required by the Descriptor Store. The storage engine is
//! opaque: anything that can get and save one document per tenant works.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::ShellDescriptor;

use crate::domain::errors::RepositoryError;

/// Document storage for descriptors, keyed by tenant name.
///
/// Production: `FileDescriptorRepository` (adapters/file.rs)
/// Testing: `InMemoryDescriptorRepository` (below)
#[async_trait]
pub trait DescriptorRepository: Send + Sync {
    async fn get_descriptor(&self, tenant: &str) -> Result<Option<ShellDescriptor>, RepositoryError>;

    async fn save_descriptor(
        &self,
        tenant: &str,
        descriptor: &ShellDescriptor,
    ) -> Result<(), RepositoryError>;
}

/// In-memory repository for tests and embedded hosts.
#[derive(Default)]
pub struct InMemoryDescriptorRepository {
    data: RwLock<HashMap<String, ShellDescriptor>>,
    saves: AtomicU64,
}

impl InMemoryDescriptorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a descriptor without going through the store.
    pub fn insert(&self, tenant: &str, descriptor: ShellDescriptor) {
        self.data.write().insert(tenant.to_string(), descriptor);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DescriptorRepository for InMemoryDescriptorRepository {
    async fn get_descriptor(&self, tenant: &str) -> Result<Option<ShellDescriptor>, RepositoryError> {
        Ok(self.data.read().get(tenant).cloned())
    }

    async fn save_descriptor(
        &self,
        tenant: &str,
        descriptor: &ShellDescriptor,
    ) -> Result<(), RepositoryError> {
        self.data
            .write()
            .insert(tenant.to_string(), descriptor.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
