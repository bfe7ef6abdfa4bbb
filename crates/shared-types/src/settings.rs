//! # Tenant Settings
//!
//! Identity, lifecycle state and store connection of a tenant.
//!
//! `ShellSettings` is a shared handle: every clone observes the same
//! lifecycle state, so a state transition made by the setup flow is visible
//! to the host and to the routing table without re-publishing the settings.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::TenantError;

/// Lifecycle state of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TenantState {
    /// Known but never set up.
    #[default]
    Uninitialized,
    /// Setup is in progress; requests should be answered as unavailable.
    Initializing,
    /// Fully configured and serving.
    Running,
    /// Broken configuration; never built.
    Invalid,
}

impl TenantState {
    /// States whose shells are built by the startup pass.
    #[must_use]
    pub fn is_buildable(&self) -> bool {
        matches!(self, Self::Running | Self::Uninitialized | Self::Initializing)
    }
}

impl fmt::Display for TenantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Uninitialized => "Uninitialized",
            Self::Initializing => "Initializing",
            Self::Running => "Running",
            Self::Invalid => "Invalid",
        };
        f.write_str(text)
    }
}

impl FromStr for TenantState {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uninitialized" => Ok(Self::Uninitialized),
            "initializing" => Ok(Self::Initializing),
            "running" => Ok(Self::Running),
            "invalid" => Ok(Self::Invalid),
            _ => Err(TenantError::UnknownState(s.to_string())),
        }
    }
}

/// Connection configuration for the tenant's document store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConnection {
    /// Storage provider identifier (opaque to the host).
    pub database_provider: Option<String>,
    /// Provider-specific connection string.
    pub connection_string: Option<String>,
    /// Prefix applied to every table owned by the tenant.
    pub table_prefix: Option<String>,
}

impl StoreConnection {
    /// Whether a provider has been chosen for this tenant.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.database_provider
            .as_deref()
            .is_some_and(|provider| !provider.is_empty())
    }
}

/// Serializable form of a tenant's settings.
///
/// This is the on-disk shape used by the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub name: String,
    #[serde(default)]
    pub state: TenantState,
    #[serde(default)]
    pub store: StoreConnection,
    #[serde(default)]
    pub request_url_host: Option<String>,
    #[serde(default)]
    pub request_url_prefix: Option<String>,
}

#[derive(Debug)]
struct SettingsInner {
    name: String,
    state: RwLock<TenantState>,
    store: RwLock<StoreConnection>,
    request_url_host: Option<String>,
    request_url_prefix: Option<String>,
}

/// Shared handle to a tenant's settings.
#[derive(Debug, Clone)]
pub struct ShellSettings {
    inner: Arc<SettingsInner>,
}

impl ShellSettings {
    /// Create settings for a tenant in the given state.
    pub fn new(name: impl Into<String>, state: TenantState) -> Result<Self, TenantError> {
        Self::from_record(SettingsRecord {
            name: name.into(),
            state,
            store: StoreConnection::default(),
            request_url_host: None,
            request_url_prefix: None,
        })
    }

    /// Build settings from their serialized form, validating the tenant name.
    pub fn from_record(record: SettingsRecord) -> Result<Self, TenantError> {
        validate_tenant_name(&record.name)?;
        Ok(Self::from_parts(record))
    }

    fn from_parts(record: SettingsRecord) -> Self {
        Self {
            inner: Arc::new(SettingsInner {
                name: record.name,
                state: RwLock::new(record.state),
                store: RwLock::new(record.store),
                request_url_host: record.request_url_host,
                request_url_prefix: record.request_url_prefix,
            }),
        }
    }

    /// Settings of the uninitialized default tenant used by the setup shell.
    #[must_use]
    pub fn default_uninitialized() -> Self {
        Self::from_parts(SettingsRecord {
            name: crate::DEFAULT_TENANT_NAME.to_string(),
            state: TenantState::Uninitialized,
            store: StoreConnection::default(),
            request_url_host: None,
            request_url_prefix: None,
        })
    }

    /// Builder-style routing configuration.
    #[must_use]
    pub fn with_route(self, host: Option<&str>, prefix: Option<&str>) -> Self {
        let mut record = self.to_record();
        record.request_url_host = host.map(str::to_string);
        record.request_url_prefix = prefix.map(str::to_string);
        Self::from_parts(record)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> TenantState {
        *self.inner.state.read()
    }

    /// Transition the tenant's lifecycle state. Visible to every clone.
    pub fn set_state(&self, state: TenantState) {
        *self.inner.state.write() = state;
    }

    pub fn store(&self) -> StoreConnection {
        self.inner.store.read().clone()
    }

    pub fn set_store(&self, store: StoreConnection) {
        *self.inner.store.write() = store;
    }

    pub fn request_url_host(&self) -> Option<&str> {
        self.inner.request_url_host.as_deref()
    }

    pub fn request_url_prefix(&self) -> Option<&str> {
        self.inner.request_url_prefix.as_deref()
    }

    /// Independent copy that no longer shares state with `self`.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::from_parts(self.to_record())
    }

    /// Whether two handles share the same underlying settings.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Snapshot of the settings in serializable form.
    #[must_use]
    pub fn to_record(&self) -> SettingsRecord {
        SettingsRecord {
            name: self.inner.name.clone(),
            state: self.state(),
            store: self.store(),
            request_url_host: self.inner.request_url_host.clone(),
            request_url_prefix: self.inner.request_url_prefix.clone(),
        }
    }
}

/// Tenant names double as storage keys and routing keys.
pub fn validate_tenant_name(name: &str) -> Result<(), TenantError> {
    let invalid = |reason| TenantError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > 128 {
        return Err(invalid("name longer than 128 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("only ASCII letters, digits, '-' and '_' are allowed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_state() {
        let settings = ShellSettings::new("alpha", TenantState::Uninitialized).unwrap();
        let clone = settings.clone();

        settings.set_state(TenantState::Running);

        assert_eq!(clone.state(), TenantState::Running);
        assert!(clone.ptr_eq(&settings));
    }

    #[test]
    fn test_fork_is_independent() {
        let settings = ShellSettings::new("alpha", TenantState::Initializing).unwrap();
        let fork = settings.fork();

        fork.set_state(TenantState::Running);

        assert_eq!(settings.state(), TenantState::Initializing);
        assert!(!fork.ptr_eq(&settings));
        assert_eq!(fork.name(), "alpha");
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(ShellSettings::new("", TenantState::Running).is_err());
        assert!(ShellSettings::new("../etc", TenantState::Running).is_err());
        assert!(ShellSettings::new("tenant one", TenantState::Running).is_err());
        assert!(ShellSettings::new("tenant_one-2", TenantState::Running).is_ok());
    }

    #[test]
    fn test_buildable_states() {
        assert!(TenantState::Running.is_buildable());
        assert!(TenantState::Uninitialized.is_buildable());
        assert!(TenantState::Initializing.is_buildable());
        assert!(!TenantState::Invalid.is_buildable());
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("running".parse::<TenantState>(), Ok(TenantState::Running));
        assert_eq!("Invalid".parse::<TenantState>(), Ok(TenantState::Invalid));
        assert!("paused".parse::<TenantState>().is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{"name":"beta","state":"Running","request_url_prefix":"beta"}"#;
        let record: SettingsRecord = serde_json::from_str(json).unwrap();
        let settings = ShellSettings::from_record(record).unwrap();

        assert_eq!(settings.state(), TenantState::Running);
        assert_eq!(settings.request_url_prefix(), Some("beta"));
        assert!(!settings.store().is_configured());
    }
}
