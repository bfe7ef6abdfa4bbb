//! # Settings Managers
//!
//! In-memory and JSON-file stores of tenant settings. Both publish
//! `HostEvent::SettingsSaved` after a successful save.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::{EventPublisher, HostEvent};
use shared_types::{validate_tenant_name, SettingsRecord, ShellSettings};
use tracing::{debug, info, warn};

use crate::errors::SettingsError;
use crate::ports::ShellSettingsManager;

/// Settings kept in process memory.
pub struct InMemoryShellSettingsManager {
    tenants: RwLock<BTreeMap<String, SettingsRecord>>,
    publisher: Arc<dyn EventPublisher>,
}

impl InMemoryShellSettingsManager {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            tenants: RwLock::new(BTreeMap::new()),
            publisher,
        }
    }

    /// Seed a tenant without publishing anything.
    #[must_use]
    pub fn with_tenant(self, settings: &ShellSettings) -> Self {
        self.tenants
            .write()
            .insert(settings.name().to_string(), settings.to_record());
        self
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.read().len()
    }
}

#[async_trait]
impl ShellSettingsManager for InMemoryShellSettingsManager {
    async fn load_settings(&self) -> Result<Vec<ShellSettings>, SettingsError> {
        let records: Vec<SettingsRecord> = self.tenants.read().values().cloned().collect();
        records
            .into_iter()
            .map(|record| ShellSettings::from_record(record).map_err(SettingsError::from))
            .collect()
    }

    async fn save_settings(&self, settings: &ShellSettings) -> Result<(), SettingsError> {
        self.tenants
            .write()
            .insert(settings.name().to_string(), settings.to_record());
        info!(tenant = settings.name(), state = %settings.state(), "Tenant settings saved");

        self.publisher.publish(HostEvent::SettingsSaved {
            settings: settings.clone(),
        });
        Ok(())
    }
}

/// One JSON document per tenant under a directory:
///
/// ```text
/// <root>/
///   Default.json
///   alpha.json
/// ```
pub struct FileShellSettingsManager {
    root: PathBuf,
    publisher: Arc<dyn EventPublisher>,
}

impl FileShellSettingsManager {
    pub fn new(root: impl Into<PathBuf>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            root: root.into(),
            publisher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_record(path: &Path) -> Result<SettingsRecord, SettingsError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SettingsError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| SettingsError::Serialization(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl ShellSettingsManager for FileShellSettingsManager {
    async fn load_settings(&self) -> Result<Vec<ShellSettings>, SettingsError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SettingsError::Io(format!("{}: {e}", self.root.display()))),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SettingsError::Io(format!("{}: {e}", self.root.display())))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tenants = Vec::with_capacity(paths.len());
        for path in paths {
            // A malformed document disables only that tenant.
            match Self::read_record(&path)
                .await
                .and_then(|record| ShellSettings::from_record(record).map_err(SettingsError::from))
            {
                Ok(settings) => tenants.push(settings),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable tenant settings"),
            }
        }

        debug!(root = %self.root.display(), tenants = tenants.len(), "Tenant settings loaded");
        Ok(tenants)
    }

    async fn save_settings(&self, settings: &ShellSettings) -> Result<(), SettingsError> {
        validate_tenant_name(settings.name())?;
        let path = self.root.join(format!("{}.json", settings.name()));
        let json = serde_json::to_vec_pretty(&settings.to_record())
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| SettingsError::Io(format!("{}: {e}", self.root.display())))?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, &json)
            .await
            .map_err(|e| SettingsError::Io(format!("{}: {e}", staging.display())))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| SettingsError::Io(format!("{}: {e}", path.display())))?;

        info!(tenant = settings.name(), state = %settings.state(), "Tenant settings saved");

        self.publisher.publish(HostEvent::SettingsSaved {
            settings: settings.clone(),
        });
        Ok(())
    }
}
