//! # Tenant Host
//!
//! Entry point of the multi-tenant shell host.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `TENANT_HOST_*` environment overrides)
//! 2. Initialize logging
//! 3. Assemble file-backed components under the data directory
//! 4. Build every tenant's shell (or the setup shell when none exists)
//! 5. Wait for Ctrl+C, then dispose every shell

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use host_runtime::{HostComponents, HostConfig};

/// Load configuration from the environment.
fn load_config() -> HostConfig {
    let mut config = HostConfig::default();

    if let Ok(dir) = std::env::var("TENANT_HOST_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(dir);
    }
    if let Ok(tenant) = std::env::var("TENANT_HOST_DEFAULT_TENANT") {
        config.startup.default_tenant = tenant;
    }
    if let Ok(secs) = std::env::var("TENANT_HOST_BUILD_TIMEOUT_SECS") {
        if let Ok(secs) = secs.parse() {
            config.startup.build_timeout_secs = secs;
        }
    }
    if let Ok(level) = std::env::var("TENANT_HOST_LOG_LEVEL") {
        config.logging.level = level;
    }

    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    config.validate().context("Invalid host configuration")?;
    info!(data_dir = %config.storage.data_dir.display(), "Starting tenant host");

    let components = HostComponents::file_backed(config);
    let host = components.host.clone();

    host.scope(host.initialize())
        .await?
        .context("Failed to create tenant shells")?;

    for tenant in host.running_tenants() {
        info!(tenant = %tenant, "Tenant shell running");
    }

    info!("Host is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    host.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}
