//! # Inbound Port
//!
//! The Descriptor Store API, resolved out of a tenant's shell container.

use async_trait::async_trait;
use shared_types::{ShellDescriptor, ShellFeature, ShellParameter};

use crate::domain::errors::StoreError;

/// Versioned access to one tenant's descriptor.
#[async_trait]
pub trait DescriptorStoreApi: Send + Sync {
    /// Tenant this store is bound to.
    fn tenant(&self) -> &str;

    /// Latest persisted descriptor, or `None` if the tenant was never configured.
    async fn get_descriptor(&self) -> Result<Option<ShellDescriptor>, StoreError>;

    /// Replace the enabled features and parameters.
    ///
    /// `prior_serial_number` must equal the stored serial number (0 when
    /// nothing is stored yet). On success the new descriptor, carrying
    /// `prior_serial_number + 1`, is returned after every `DescriptorChanged`
    /// subscriber has run.
    async fn update_descriptor(
        &self,
        prior_serial_number: i64,
        features: Vec<ShellFeature>,
        parameters: Vec<ShellParameter>,
    ) -> Result<ShellDescriptor, StoreError>;
}
