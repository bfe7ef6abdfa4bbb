//! # Shell Registry
//!
//! Tenant name → current shell. Concurrent reads and inserts without an
//! external lock; at most one entry per tenant.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ts_02_shell_builder::ShellContext;

#[derive(Default)]
pub struct ShellRegistry {
    shells: DashMap<String, Arc<ShellContext>>,
}

impl ShellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tenant: &str) -> Option<Arc<ShellContext>> {
        self.shells.get(tenant).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, tenant: &str) -> bool {
        self.shells.contains_key(tenant)
    }

    /// Register `shell` unless its tenant already has one.
    pub fn try_insert(&self, shell: Arc<ShellContext>) -> bool {
        match self.shells.entry(shell.tenant().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(shell);
                true
            }
        }
    }

    /// Make `shell` current for its tenant and hand back the one it replaced.
    ///
    /// The returned shell is no longer reachable through the registry.
    pub fn replace(&self, shell: Arc<ShellContext>) -> Option<Arc<ShellContext>> {
        self.shells.insert(shell.tenant().to_string(), shell)
    }

    pub fn remove(&self, tenant: &str) -> Option<Arc<ShellContext>> {
        self.shells.remove(tenant).map(|(_, shell)| shell)
    }

    /// Remove every shell, returning them.
    pub fn drain(&self) -> Vec<Arc<ShellContext>> {
        let names: Vec<String> = self.shells.iter().map(|e| e.key().clone()).collect();
        names.iter().filter_map(|name| self.remove(name)).collect()
    }

    /// Registered tenant names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shells.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ShellDescriptor, ShellSettings, TenantState};
    use ts_02_shell_builder::{ContainerBuilder, ShellBlueprint};

    fn shell(name: &str, serial: i64) -> Arc<ShellContext> {
        let settings = ShellSettings::new(name, TenantState::Running).unwrap();
        let blueprint = ShellBlueprint {
            tenant: name.to_string(),
            descriptor: ShellDescriptor::new(serial, Vec::new(), Vec::new()),
            features: Vec::new(),
        };
        Arc::new(ShellContext::new(
            settings,
            blueprint,
            ContainerBuilder::new(name).build(),
        ))
    }

    #[test]
    fn test_try_insert_keeps_first() {
        let registry = ShellRegistry::new();

        assert!(registry.try_insert(shell("alpha", 1)));
        assert!(!registry.try_insert(shell("alpha", 2)));

        assert_eq!(registry.get("alpha").unwrap().serial_number(), 1);
    }

    #[test]
    fn test_replace_returns_previous() {
        let registry = ShellRegistry::new();
        registry.try_insert(shell("alpha", 1));

        let previous = registry.replace(shell("alpha", 2)).unwrap();

        assert_eq!(previous.serial_number(), 1);
        assert_eq!(registry.get("alpha").unwrap().serial_number(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_drain_empties_registry() {
        let registry = ShellRegistry::new();
        registry.try_insert(shell("beta", 1));
        registry.try_insert(shell("alpha", 1));
        assert_eq!(registry.names(), vec!["alpha", "beta"]);

        let drained = registry.drain();

        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.get("alpha").is_none());
    }
}
