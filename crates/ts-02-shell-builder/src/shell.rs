//! # Shell Context
//!
//! One tenant's built shell: its settings, the blueprint it was composed
//! from, and the service container. A shell is disposed exactly once,
//! either by the host when it is replaced or by `Drop`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::ShellSettings;
use tracing::{debug, info};

use crate::container::{ServiceScope, ShellContainer};
use crate::domain::blueprint::ShellBlueprint;
use crate::domain::errors::ShellError;

pub struct ShellContext {
    settings: ShellSettings,
    blueprint: Arc<ShellBlueprint>,
    container: RwLock<Option<Arc<ShellContainer>>>,
    activated: AtomicBool,
    disposed: AtomicBool,
}

impl ShellContext {
    pub fn new(settings: ShellSettings, blueprint: ShellBlueprint, container: ShellContainer) -> Self {
        Self {
            settings,
            blueprint: Arc::new(blueprint),
            container: RwLock::new(Some(Arc::new(container))),
            activated: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    pub fn tenant(&self) -> &str {
        self.settings.name()
    }

    pub fn blueprint(&self) -> &Arc<ShellBlueprint> {
        &self.blueprint
    }

    pub fn serial_number(&self) -> i64 {
        self.blueprint.serial_number()
    }

    /// The container, unless the shell has been disposed.
    pub fn service_provider(&self) -> Result<Arc<ShellContainer>, ShellError> {
        self.container
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| ShellError::Disposed {
                tenant: self.tenant().to_string(),
            })
    }

    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ShellError> {
        self.service_provider()?.require::<T>()
    }

    /// Open a nested scope for one unit of work.
    pub fn create_service_scope(&self) -> Result<ServiceScope, ShellError> {
        Ok(self.service_provider()?.create_scope())
    }

    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    /// Returns `false` if the shell was already activated.
    pub fn mark_activated(&self) -> bool {
        !self.activated.swap(true, Ordering::AcqRel)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the container. Later calls do nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let container = self.container.write().take();
        if let Some(container) = container {
            info!(tenant = self.tenant(), serial = self.serial_number(), "Disposing shell");
            container.dispose();
        }
    }
}

impl Drop for ShellContext {
    fn drop(&mut self) {
        if !self.is_disposed() {
            debug!(tenant = self.tenant(), "Shell dropped without explicit disposal");
            self.dispose();
        }
    }
}

impl std::fmt::Debug for ShellContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellContext")
            .field("tenant", &self.tenant())
            .field("serial_number", &self.serial_number())
            .field("features", &self.blueprint.features)
            .field("activated", &self.is_activated())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
