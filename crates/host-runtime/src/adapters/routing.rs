//! # Running Shell Table
//!
//! Maps incoming requests to activated tenants by host name and URL prefix.
//!
//! ## Matching
//!
//! 1. Entries whose host equals the request host (port and case ignored)
//!    win over entries without a host.
//! 2. Among those, the longest matching URL prefix wins; an entry without a
//!    prefix matches every path.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use shared_types::ShellSettings;
use tracing::debug;

use crate::ports::RunningShellTable;

#[derive(Default)]
pub struct InMemoryRunningShellTable {
    shells: RwLock<BTreeMap<String, ShellSettings>>,
}

impl InMemoryRunningShellTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tenant: &str) -> Option<ShellSettings> {
        self.shells.read().get(tenant).cloned()
    }

    /// Routed tenant names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.shells.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.shells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.read().is_empty()
    }
}

impl RunningShellTable for InMemoryRunningShellTable {
    fn add(&self, settings: &ShellSettings) {
        debug!(tenant = settings.name(), "Adding tenant route");
        self.shells
            .write()
            .insert(settings.name().to_string(), settings.clone());
    }

    fn update(&self, settings: &ShellSettings) {
        debug!(tenant = settings.name(), "Updating tenant route");
        self.shells
            .write()
            .insert(settings.name().to_string(), settings.clone());
    }

    fn remove(&self, tenant: &str) {
        debug!(tenant, "Removing tenant route");
        self.shells.write().remove(tenant);
    }

    fn match_request(&self, host: &str, path: &str) -> Option<ShellSettings> {
        let host = strip_port(host);
        let shells = self.shells.read();

        shells
            .values()
            .filter_map(|settings| {
                let host_rank = match settings.request_url_host() {
                    Some(expected) if expected.eq_ignore_ascii_case(host) => 1,
                    Some(_) => return None,
                    None => 0,
                };
                let prefix_len = match settings.request_url_prefix() {
                    Some(prefix) => {
                        let prefix = prefix.trim_matches('/');
                        if !matches_prefix(path, prefix) {
                            return None;
                        }
                        prefix.len()
                    }
                    None => 0,
                };
                Some(((host_rank, prefix_len), settings))
            })
            .max_by_key(|(rank, _)| *rank)
            .map(|(_, settings)| settings.clone())
    }
}

fn strip_port(host: &str) -> &str {
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

/// Whether `path` starts with the segment(s) `prefix`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    let path = path.trim_start_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
