//! # Host Configuration
//!
//! Runtime parameters of the tenant host. Every field has a default and can
//! be overridden from the environment by the binary.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use shared_types::{validate_tenant_name, DEFAULT_TENANT_NAME};

/// Complete host configuration.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// Where settings and descriptors are persisted.
    pub storage: StorageConfig,
    /// Startup behaviour.
    pub startup: StartupConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

impl HostConfig {
    /// Check the configuration before the host is assembled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }
        validate_tenant_name(&self.startup.default_tenant)
            .map_err(|e| ConfigError::InvalidDefaultTenant(e.to_string()))?;
        if self.startup.build_timeout_secs == 0 {
            return Err(ConfigError::ZeroBuildTimeout);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Data directory must not be empty")]
    EmptyDataDir,

    #[error("Invalid default tenant: {0}")]
    InvalidDefaultTenant(String),

    #[error("Build timeout must be at least one second")]
    ZeroBuildTimeout,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root of the host's data.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// One settings document per tenant.
    pub fn tenants_dir(&self) -> PathBuf {
        self.data_dir.join("tenants")
    }

    /// One descriptor document per tenant.
    pub fn descriptors_dir(&self) -> PathBuf {
        self.data_dir.join("descriptors")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Startup configuration.
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Tenant set up through the fallback setup shell.
    pub default_tenant: String,
    /// Upper bound for building one tenant's shell.
    pub build_timeout_secs: u64,
}

impl StartupConfig {
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            default_tenant: DEFAULT_TENANT_NAME.to_string(),
            build_timeout_secs: 30,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
