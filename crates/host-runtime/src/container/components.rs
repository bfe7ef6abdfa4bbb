//! # Host Components
//!
//! Holds the wired host and the collaborators it was built from.

use std::sync::Arc;

use shared_bus::InMemoryEventBus;
use shared_types::ShellSettings;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use ts_01_descriptor_store::{DescriptorRepository, FileDescriptorRepository};
use ts_02_shell_builder::{
    CatalogCompositionStrategy, DefaultShellContextFactory, FeatureCatalog, ShellContextFactory,
};

use crate::adapters::{FileShellSettingsManager, InMemoryRunningShellTable, LoggingRecipeManager};
use crate::container::config::HostConfig;
use crate::host::ShellHost;
use crate::modules::{core_modules, RecipesModule, SettingsModule};
use crate::ports::{RecipeManager, ShellSettingsManager};
use crate::setup::SetupService;
use crate::wiring::{wire_host_events, HostSubscriptions};

pub struct HostComponents {
    pub config: HostConfig,
    pub bus: Arc<InMemoryEventBus>,
    pub settings_manager: Arc<dyn ShellSettingsManager>,
    pub routing: Arc<InMemoryRunningShellTable>,
    pub factory: Arc<dyn ShellContextFactory>,
    pub host: Arc<ShellHost>,
    _subscriptions: HostSubscriptions,
}

impl HostComponents {
    /// Wire a host over the given collaborators.
    #[instrument(skip_all)]
    pub fn new(
        config: HostConfig,
        bus: Arc<InMemoryEventBus>,
        settings_manager: Arc<dyn ShellSettingsManager>,
        descriptors: Arc<dyn DescriptorRepository>,
        recipes: Arc<dyn RecipeManager>,
    ) -> Self {
        let shutdown = CancellationToken::new();

        let containers = core_modules(
            SettingsModule::new(descriptors, bus.clone(), shutdown.clone()),
            RecipesModule::new(recipes),
        );
        let composition =
            CatalogCompositionStrategy::new(Arc::new(FeatureCatalog::with_core_features()));
        let factory: Arc<dyn ShellContextFactory> = Arc::new(DefaultShellContextFactory::new(
            Arc::new(composition),
            Arc::new(containers),
        ));

        let routing = Arc::new(InMemoryRunningShellTable::new());
        let host = Arc::new(
            ShellHost::new(
                Arc::clone(&settings_manager),
                Arc::clone(&factory),
                routing.clone(),
            )
            .with_default_tenant(config.startup.default_tenant.clone())
            .with_build_timeout(config.startup.build_timeout())
            .with_shutdown_token(shutdown),
        );
        let subscriptions = wire_host_events(&bus, &host);

        info!(default_tenant = %config.startup.default_tenant, "Host components assembled");

        Self {
            config,
            bus,
            settings_manager,
            routing,
            factory,
            host,
            _subscriptions: subscriptions,
        }
    }

    /// Host persisting settings and descriptors under `config.storage.data_dir`.
    pub fn file_backed(config: HostConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let settings_manager = Arc::new(FileShellSettingsManager::new(
            config.storage.tenants_dir(),
            bus.clone(),
        ));
        let descriptors = Arc::new(FileDescriptorRepository::new(
            config.storage.descriptors_dir(),
        ));
        Self::new(
            config,
            bus,
            settings_manager,
            descriptors,
            Arc::new(LoggingRecipeManager::new()),
        )
    }

    /// Setup service for the tenant owning `settings`.
    pub fn setup_service(&self, settings: ShellSettings) -> SetupService {
        SetupService::new(settings, Arc::clone(&self.host), Arc::clone(&self.factory))
    }
}
