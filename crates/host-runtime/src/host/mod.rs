//! # Shell Host
//!
//! Process-wide owner of every tenant's current shell.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──first use──→ Initializing ──batch done──→ Ready
//!                  (startup lock)    │
//!                                    ├─ settings: Running | Uninitialized | Initializing
//!                                    ├─ none → fallback setup shell
//!                                    └─ build each tenant in parallel, register + route
//! ```
//!
//! ## Locks
//!
//! - Startup lock: exactly one build pass populates the registry. Callers
//!   arriving during the pass wait, then read the registry lock-free.
//! - Restart lock: restarts are drained one at a time, independently of the
//!   startup lock, so one tenant is never rebuilt by two tasks at once.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use shared_types::{ShellSettings, TenantState, DEFAULT_TENANT_NAME};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use ts_02_shell_builder::{BuildError, ShellContext, ShellContextFactory};

use crate::errors::{HostError, SettingsError};
use crate::ports::{RunningShellTable, ShellSettingsManager};
use crate::registry::ShellRegistry;
use crate::restart::RestartQueue;

type BuildOutcome = (ShellSettings, Result<ShellContext, BuildError>);

pub struct ShellHost {
    settings_manager: Arc<dyn ShellSettingsManager>,
    factory: Arc<dyn ShellContextFactory>,
    routing: Arc<dyn RunningShellTable>,
    default_tenant: String,
    build_timeout: Option<Duration>,
    startup_lock: AsyncMutex<()>,
    registry: RwLock<Option<Arc<ShellRegistry>>>,
    restart_lock: AsyncMutex<()>,
    build_passes: AtomicU64,
    shutdown: CancellationToken,
}

impl ShellHost {
    pub fn new(
        settings_manager: Arc<dyn ShellSettingsManager>,
        factory: Arc<dyn ShellContextFactory>,
        routing: Arc<dyn RunningShellTable>,
    ) -> Self {
        Self {
            settings_manager,
            factory,
            routing,
            default_tenant: DEFAULT_TENANT_NAME.to_string(),
            build_timeout: None,
            startup_lock: AsyncMutex::new(()),
            registry: RwLock::new(None),
            restart_lock: AsyncMutex::new(()),
            build_passes: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Tenant that receives the fallback setup shell.
    #[must_use]
    pub fn with_default_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.default_tenant = tenant.into();
        self
    }

    /// Fail a tenant's build that takes longer than `timeout`.
    #[must_use]
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = Some(timeout);
        self
    }

    /// Token cancelled by `shutdown`.
    #[must_use]
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Build every tenant's shell if that has not happened yet, then drain
    /// pending restarts. Safe to call repeatedly.
    pub async fn initialize(&self) -> Result<(), HostError> {
        self.initialize_with_cancel(CancellationToken::new()).await
    }

    /// `initialize` with a cancellable build pass. Cancelling aborts the
    /// builds still in flight; shells already registered stay registered.
    #[instrument(skip_all)]
    pub async fn initialize_with_cancel(&self, cancel: CancellationToken) -> Result<(), HostError> {
        self.ensure_registry(&cancel).await?;
        self.start_updated_shells().await?;
        Ok(())
    }

    /// Number of build passes run since creation or the last reset.
    pub fn build_passes(&self) -> u64 {
        self.build_passes.load(Ordering::SeqCst)
    }

    fn current_registry(&self) -> Option<Arc<ShellRegistry>> {
        self.registry.read().clone()
    }

    async fn ensure_registry(&self, cancel: &CancellationToken) -> Result<Arc<ShellRegistry>, HostError> {
        if let Some(registry) = self.current_registry() {
            return Ok(registry);
        }

        let _startup = self.startup_lock.lock().await;
        if let Some(registry) = self.current_registry() {
            return Ok(registry);
        }
        if self.shutdown.is_cancelled() {
            return Err(HostError::Cancelled);
        }

        self.build_passes.fetch_add(1, Ordering::SeqCst);
        let registry = Arc::new(ShellRegistry::new());

        match self.create_and_activate_shells(&registry, cancel).await {
            Ok(completed) => {
                *self.registry.write() = Some(Arc::clone(&registry));
                if completed {
                    Ok(registry)
                } else {
                    Err(HostError::Cancelled)
                }
            }
            Err(e) => {
                self.release(&registry);
                Err(e)
            }
        }
    }

    /// One build pass. Returns `false` when cancelled before every build
    /// finished.
    #[instrument(skip_all)]
    async fn create_and_activate_shells(
        &self,
        registry: &ShellRegistry,
        cancel: &CancellationToken,
    ) -> Result<bool, HostError> {
        info!("Start creation of shells");

        let eligible: Vec<ShellSettings> = self
            .settings_manager
            .load_settings()
            .await?
            .into_iter()
            .filter(|settings| settings.state().is_buildable())
            .collect();

        if eligible.is_empty() {
            debug!(tenant = %self.default_tenant, "No tenant configured, creating setup shell");
            let settings = ShellSettings::new(self.default_tenant.clone(), TenantState::Uninitialized)
                .map_err(SettingsError::from)?;
            let shell = self
                .factory
                .create_setup_context(&settings)
                .map_err(|e| HostError::from_build(settings.name(), e))?;
            self.activate_shell(registry, Arc::new(shell));
            info!("Done creating shells");
            return Ok(true);
        }

        let mut builds: JoinSet<BuildOutcome> = JoinSet::new();
        for settings in eligible {
            let factory = Arc::clone(&self.factory);
            let timeout = self.build_timeout;
            builds.spawn(async move {
                let result = build_tenant(factory.as_ref(), &settings, timeout).await;
                (settings, result)
            });
        }

        let mut completed = true;
        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    completed = false;
                    break;
                }
                _ = self.shutdown.cancelled() => {
                    completed = false;
                    break;
                }
                joined = builds.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((settings, Ok(shell))) => {
                    debug!(tenant = settings.name(), "Shell built");
                    self.activate_shell(registry, Arc::new(shell));
                }
                Ok((settings, Err(e))) if e.is_fatal() => {
                    error!(tenant = settings.name(), error = %e, "Fatal error while creating shells");
                    abort_builds(&mut builds).await;
                    return Err(HostError::from_build(settings.name(), e));
                }
                Ok((settings, Err(e))) => {
                    error!(tenant = settings.name(), error = %e, "A tenant could not be started");
                }
                Err(e) if e.is_panic() => {
                    error!(error = %e, "A tenant build panicked");
                }
                Err(e) => {
                    debug!(error = %e, "Tenant build aborted");
                }
            }
        }

        if !completed {
            warn!(remaining = builds.len(), "Shell creation cancelled");
            abort_builds(&mut builds).await;
        }

        info!(tenants = registry.len(), "Done creating shells");
        Ok(completed)
    }

    /// Register and route a freshly built shell.
    fn activate_shell(&self, registry: &ShellRegistry, shell: Arc<ShellContext>) {
        debug!(tenant = shell.tenant(), "Activating context for tenant");
        if registry.try_insert(Arc::clone(&shell)) {
            self.routing.add(shell.settings());
            shell.mark_activated();
            info!(tenant = shell.tenant(), serial = shell.serial_number(), "Shell activated");
        } else {
            warn!(tenant = shell.tenant(), "Tenant already has a shell, discarding duplicate");
            shell.dispose();
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// The current shell of `tenant`. Populates the registry on first use.
    pub async fn get_shell_context(&self, tenant: &str) -> Result<Arc<ShellContext>, HostError> {
        let registry = self.ensure_registry(&CancellationToken::new()).await?;
        registry.get(tenant).ok_or_else(|| HostError::NotFound {
            tenant: tenant.to_string(),
        })
    }

    /// Build a shell for `settings` without registering it.
    pub async fn create_shell_context(&self, settings: &ShellSettings) -> Result<ShellContext, HostError> {
        build_tenant(self.factory.as_ref(), settings, self.build_timeout)
            .await
            .map_err(|e| HostError::from_build(settings.name(), e))
    }

    /// Names of the tenants with a registered shell, sorted.
    pub fn running_tenants(&self) -> Vec<String> {
        self.current_registry()
            .map(|registry| registry.names())
            .unwrap_or_default()
    }

    /// Persist `settings`; the resulting `SettingsSaved` schedules a restart.
    pub async fn update_shell_settings(&self, settings: &ShellSettings) -> Result<(), HostError> {
        self.settings_manager.save_settings(settings).await?;
        Ok(())
    }

    // =========================================================================
    // Restarts
    // =========================================================================

    /// Descriptor of `tenant` changed. Queues a restart if the tenant is
    /// registered and running.
    pub fn on_descriptor_changed(&self, tenant: &str) -> bool {
        debug!(tenant, "Shell descriptor changed");

        let Some(shell) = self.current_registry().and_then(|registry| registry.get(tenant)) else {
            return false;
        };
        if shell.settings().state() != TenantState::Running {
            debug!(tenant, state = %shell.settings().state(), "Tenant not running, restart skipped");
            return false;
        }
        queue_restart(shell.settings().clone())
    }

    /// Settings of a tenant were saved. Routes and queues a running tenant.
    pub fn on_settings_saved(&self, settings: &ShellSettings) -> bool {
        debug!(tenant = settings.name(), state = %settings.state(), "Shell settings saved");

        if settings.state() != TenantState::Running {
            return false;
        }
        self.routing.update(settings);
        queue_restart(settings.clone())
    }

    /// Drain the ambient restart queue.
    pub async fn start_updated_shells(&self) -> Result<usize, HostError> {
        match RestartQueue::current() {
            Some(queue) => self.drain(&queue).await,
            None => Ok(0),
        }
    }

    /// Rebuild every tenant in `queue`, one at a time. A failed rebuild keeps
    /// the tenant's current shell.
    #[instrument(skip_all, fields(pending = queue.len()))]
    pub async fn drain(&self, queue: &RestartQueue) -> Result<usize, HostError> {
        if queue.is_empty() {
            return Ok(0);
        }

        // Read after locking: a reset queued ahead of us may replace the registry.
        let _restart = self.restart_lock.lock().await;
        let Some(registry) = self.current_registry() else {
            debug!("Registry not built, restarts deferred");
            return Ok(0);
        };
        let mut restarted = 0;
        while let Some(settings) = queue.pop() {
            debug!(tenant = settings.name(), "Updating shell");
            match self.create_shell_context(&settings).await {
                Ok(shell) => {
                    self.swap_shell(&registry, Arc::new(shell));
                    restarted += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(tenant = settings.name(), error = %e, "Restart failed, keeping current shell");
                }
            }
        }
        Ok(restarted)
    }

    /// Publish `shell` as current, then dispose the one it replaced.
    fn swap_shell(&self, registry: &ShellRegistry, shell: Arc<ShellContext>) {
        shell.mark_activated();
        let previous = registry.replace(Arc::clone(&shell));
        match previous {
            Some(_) => self.routing.update(shell.settings()),
            None => self.routing.add(shell.settings()),
        }
        info!(tenant = shell.tenant(), serial = shell.serial_number(), "Shell restarted");

        if let Some(previous) = previous {
            previous.dispose();
        }
    }

    // =========================================================================
    // Units of work
    // =========================================================================

    /// Run `work` with its own restart queue, then drain that queue.
    pub async fn scope<F: Future>(&self, work: F) -> Result<F::Output, HostError> {
        let queue = RestartQueue::new();
        let output = queue.clone().scope(work).await;
        self.drain(&queue).await?;
        Ok(output)
    }

    /// Spawn `work`, carrying the current restart queue into the new task.
    pub fn spawn_in_scope<F>(work: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match RestartQueue::current() {
            Some(queue) => tokio::spawn(queue.scope(work)),
            None => tokio::spawn(work),
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Dispose every shell and forget the registry; the next use runs a new
    /// build pass.
    pub async fn reset(&self) {
        let _startup = self.startup_lock.lock().await;
        let _restart = self.restart_lock.lock().await;

        let previous = self.registry.write().take();
        if let Some(registry) = previous {
            info!(tenants = registry.len(), "Resetting shell host");
            self.release(&registry);
        }
    }

    /// Cancel outstanding work and dispose every shell.
    pub async fn shutdown(&self) {
        info!("Shutting down shell host");
        self.shutdown.cancel();
        self.reset().await;
    }

    fn release(&self, registry: &ShellRegistry) {
        for shell in registry.drain() {
            self.routing.remove(shell.tenant());
            shell.dispose();
        }
    }
}

async fn build_tenant(
    factory: &dyn ShellContextFactory,
    settings: &ShellSettings,
    timeout: Option<Duration>,
) -> Result<ShellContext, BuildError> {
    debug!(tenant = settings.name(), state = %settings.state(), "Creating shell context");
    let build = factory.create_shell_context(settings);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, build)
            .await
            .map_err(|_| BuildError::TimedOut {
                tenant: settings.name().to_string(),
                seconds: limit.as_secs(),
            })?,
        None => build.await,
    }
}

async fn abort_builds(builds: &mut JoinSet<BuildOutcome>) {
    builds.abort_all();
    while let Some(joined) = builds.join_next().await {
        if let Ok((_, Ok(shell))) = joined {
            shell.dispose();
        }
    }
}

fn queue_restart(settings: ShellSettings) -> bool {
    let Some(queue) = RestartQueue::current() else {
        warn!(tenant = settings.name(), "No restart scope active, restart not scheduled");
        return false;
    };
    let tenant = settings.name().to_string();
    let added = queue.enqueue(settings);
    if added {
        debug!(tenant = %tenant, "Adding tenant to restart");
    }
    added
}
