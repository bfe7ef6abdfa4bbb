//! # Update Serialization
//!
//! The read-compare-write of an update must not interleave with another
//! update of the same tenant, even when the two calls come from different
//! shells (an old shell still finishing a request and its replacement).
//! Every store built for a tenant therefore shares one `TenantLocks`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

/// Per-tenant async mutexes, created on first use.
#[derive(Default)]
pub struct TenantLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding updates of `tenant`.
    pub fn for_tenant(&self, tenant: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(tenant.to_string()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_tenant_same_lock() {
        let locks = TenantLocks::new();
        let a = locks.for_tenant("alpha");
        let b = locks.for_tenant("alpha");
        let c = locks.for_tenant("beta");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
