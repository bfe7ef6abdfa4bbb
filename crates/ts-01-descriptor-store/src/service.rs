//! # Descriptor Store Service
//!
//! Implements `DescriptorStoreApi` on top of a `DescriptorRepository`.
//!
//! ## Update Protocol
//!
//! ```text
//! lock(tenant) → get → compare prior serial → save(prior + 1) → unlock
//!                                                  │
//!                                                  ↓
//!                                  publish DescriptorChanged (synchronous)
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use shared_bus::{EventPublisher, HostEvent};
use shared_types::{ShellDescriptor, ShellFeature, ShellParameter, UNCONFIGURED_SERIAL_NUMBER};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::{RepositoryError, StoreError};
use crate::domain::locks::TenantLocks;
use crate::ports::inbound::DescriptorStoreApi;
use crate::ports::outbound::DescriptorRepository;

/// Descriptor Store bound to one tenant.
pub struct DescriptorStore {
    tenant: String,
    repository: Arc<dyn DescriptorRepository>,
    publisher: Arc<dyn EventPublisher>,
    locks: Arc<TenantLocks>,
    cancel: CancellationToken,
}

impl DescriptorStore {
    pub fn new(
        tenant: impl Into<String>,
        repository: Arc<dyn DescriptorRepository>,
        publisher: Arc<dyn EventPublisher>,
        locks: Arc<TenantLocks>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            repository,
            publisher,
            locks,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort persistence round-trips when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    async fn cancellable<T>(
        &self,
        operation: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, StoreError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            result = operation => result.map_err(StoreError::from),
        }
    }
}

#[async_trait]
impl DescriptorStoreApi for DescriptorStore {
    fn tenant(&self) -> &str {
        &self.tenant
    }

    async fn get_descriptor(&self) -> Result<Option<ShellDescriptor>, StoreError> {
        self.cancellable(self.repository.get_descriptor(&self.tenant))
            .await
    }

    async fn update_descriptor(
        &self,
        prior_serial_number: i64,
        features: Vec<ShellFeature>,
        parameters: Vec<ShellParameter>,
    ) -> Result<ShellDescriptor, StoreError> {
        let lock = self.locks.for_tenant(&self.tenant);
        let guard = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(StoreError::Cancelled),
            guard = lock.lock() => guard,
        };

        let stored = self
            .cancellable(self.repository.get_descriptor(&self.tenant))
            .await?;
        let actual = stored
            .as_ref()
            .map_or(UNCONFIGURED_SERIAL_NUMBER, |d| d.serial_number);

        if prior_serial_number != actual {
            warn!(
                tenant = %self.tenant,
                expected = prior_serial_number,
                actual,
                "Rejected stale descriptor update"
            );
            return Err(StoreError::ConcurrencyConflict {
                tenant: self.tenant.clone(),
                expected: prior_serial_number,
                actual,
            });
        }

        let next = actual
            .checked_add(1)
            .ok_or_else(|| StoreError::SerialExhausted {
                tenant: self.tenant.clone(),
                serial: actual,
            })?;

        info!(tenant = %self.tenant, "Updating shell descriptor");
        let descriptor = ShellDescriptor::new(next, features, parameters);
        debug!(
            tenant = %self.tenant,
            features = ?descriptor.feature_names().collect::<Vec<_>>(),
            "Enabled features set"
        );
        debug!(
            tenant = %self.tenant,
            parameters = ?descriptor
                .parameters
                .iter()
                .map(|p| format!("{}.{}={}", p.component, p.name, p.value))
                .collect::<Vec<_>>(),
            "Parameters set"
        );

        self.cancellable(self.repository.save_descriptor(&self.tenant, &descriptor))
            .await?;
        drop(guard);

        info!(tenant = %self.tenant, serial = descriptor.serial_number, "Shell descriptor updated");

        self.publisher.publish(HostEvent::DescriptorChanged {
            tenant: self.tenant.clone(),
            descriptor: descriptor.clone(),
        });

        Ok(descriptor)
    }
}
