//! # Feature Modules
//!
//! Services each built-in feature contributes to a tenant's container.
//!
//! | Feature | Registers |
//! |---------|-----------|
//! | `logging` | `TenantLog` |
//! | `hosting` | the tenant's `ShellSettings` |
//! | `settings` | `dyn DescriptorStoreApi` |
//! | `recipes` | `dyn RecipeManager` |

use std::sync::Arc;

use shared_bus::EventPublisher;
use shared_types::{features, ShellSettings};
use tokio_util::sync::CancellationToken;
use tracing::Span;
use ts_01_descriptor_store::{DescriptorRepository, DescriptorStore, DescriptorStoreApi, TenantLocks};
use ts_02_shell_builder::{
    BuildError, ContainerBuilder, FeatureModule, ModuleContainerFactory, ModuleContext,
};

use crate::ports::RecipeManager;

/// Tenant-scoped tracing span.
pub struct TenantLog {
    span: Span,
}

impl TenantLog {
    pub fn span(&self) -> &Span {
        &self.span
    }
}

pub struct LoggingModule;

impl FeatureModule for LoggingModule {
    fn feature(&self) -> &str {
        features::LOGGING
    }

    fn configure(
        &self,
        builder: &mut ContainerBuilder,
        context: &ModuleContext<'_>,
    ) -> Result<(), BuildError> {
        let span = tracing::info_span!(
            "tenant",
            tenant = context.settings.name(),
            serial = context.blueprint.serial_number()
        );
        builder.add_singleton(Arc::new(TenantLog { span }));
        Ok(())
    }
}

pub struct HostingModule;

impl FeatureModule for HostingModule {
    fn feature(&self) -> &str {
        features::HOSTING
    }

    fn configure(
        &self,
        builder: &mut ContainerBuilder,
        context: &ModuleContext<'_>,
    ) -> Result<(), BuildError> {
        builder.add_singleton::<ShellSettings>(Arc::new(context.settings.clone()));
        Ok(())
    }
}

/// Registers the tenant's descriptor store. All stores of a host share one
/// repository, publisher and lock table.
pub struct SettingsModule {
    repository: Arc<dyn DescriptorRepository>,
    publisher: Arc<dyn EventPublisher>,
    locks: Arc<TenantLocks>,
    cancel: CancellationToken,
}

impl SettingsModule {
    pub fn new(
        repository: Arc<dyn DescriptorRepository>,
        publisher: Arc<dyn EventPublisher>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            repository,
            publisher,
            locks: Arc::new(TenantLocks::new()),
            cancel,
        }
    }
}

impl FeatureModule for SettingsModule {
    fn feature(&self) -> &str {
        features::SETTINGS
    }

    fn configure(
        &self,
        builder: &mut ContainerBuilder,
        context: &ModuleContext<'_>,
    ) -> Result<(), BuildError> {
        let store = DescriptorStore::new(
            context.settings.name(),
            Arc::clone(&self.repository),
            Arc::clone(&self.publisher),
            Arc::clone(&self.locks),
        )
        .with_cancellation(self.cancel.child_token());
        builder.add_singleton::<dyn DescriptorStoreApi>(Arc::new(store));
        Ok(())
    }
}

pub struct RecipesModule {
    manager: Arc<dyn RecipeManager>,
}

impl RecipesModule {
    pub fn new(manager: Arc<dyn RecipeManager>) -> Self {
        Self { manager }
    }
}

impl FeatureModule for RecipesModule {
    fn feature(&self) -> &str {
        features::RECIPES
    }

    fn configure(
        &self,
        builder: &mut ContainerBuilder,
        _context: &ModuleContext<'_>,
    ) -> Result<(), BuildError> {
        builder.add_singleton::<dyn RecipeManager>(Arc::clone(&self.manager));
        Ok(())
    }
}

/// Container factory holding every built-in feature module.
pub fn core_modules(settings: SettingsModule, recipes: RecipesModule) -> ModuleContainerFactory {
    ModuleContainerFactory::new()
        .with_module(Arc::new(LoggingModule))
        .with_module(Arc::new(HostingModule))
        .with_module(Arc::new(settings))
        .with_module(Arc::new(recipes))
}
