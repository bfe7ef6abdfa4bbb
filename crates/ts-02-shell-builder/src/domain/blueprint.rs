//! # Shell Blueprint
//!
//! The composed service graph description: which features, in which order,
//! make up a tenant's container.

use shared_types::ShellDescriptor;

/// Result of composing a descriptor for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellBlueprint {
    /// Tenant the blueprint was composed for.
    pub tenant: String,
    /// Descriptor the blueprint was composed from.
    pub descriptor: ShellDescriptor,
    /// Enabled features with dependencies expanded, dependencies first.
    pub features: Vec<String>,
}

impl ShellBlueprint {
    #[must_use]
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    #[must_use]
    pub fn serial_number(&self) -> i64 {
        self.descriptor.serial_number
    }
}
