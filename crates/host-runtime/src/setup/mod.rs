//! # Setup Service
//!
//! First-time setup of a tenant:
//!
//! 1. Mark the tenant `Initializing` so it is not restarted mid-setup
//! 2. Build a shell from the mandatory setup features and write the first
//!    descriptor through it (serial 0 → 1)
//! 3. Build the tenant's shell through the host and run the setup recipe
//! 4. Mark the tenant `Running` and save its settings, which schedules the
//!    restart that replaces the setup shell
//!
//! On failure the tenant's original state is restored.

use std::sync::Arc;

use shared_types::{
    features, ShellDescriptor, ShellFeature, ShellParameter, ShellSettings, StoreConnection,
    TenantState, UNCONFIGURED_SERIAL_NUMBER,
};
use tracing::{debug, info, Instrument, Span};
use ts_01_descriptor_store::DescriptorStoreApi;
use ts_02_shell_builder::{ShellContext, ShellContextFactory};

use crate::errors::HostError;
use crate::host::ShellHost;
use crate::modules::TenantLog;
use crate::ports::Recipe;
use crate::recipes::RecipeExecutor;
use crate::restart::RestartQueue;

/// Input of a setup run.
#[derive(Debug, Clone, Default)]
pub struct SetupContext {
    /// Features enabled on top of the mandatory setup features.
    pub enabled_features: Vec<String>,
    /// Initial descriptor parameters.
    pub parameters: Vec<ShellParameter>,
    /// Used only when the tenant has no store configured yet.
    pub database_provider: Option<String>,
    pub connection_string: Option<String>,
    pub table_prefix: Option<String>,
    /// Recipe that creates the tenant's initial data.
    pub recipe: Recipe,
}

pub struct SetupService {
    settings: ShellSettings,
    host: Arc<ShellHost>,
    factory: Arc<dyn ShellContextFactory>,
}

impl SetupService {
    pub fn new(
        settings: ShellSettings,
        host: Arc<ShellHost>,
        factory: Arc<dyn ShellContextFactory>,
    ) -> Self {
        Self {
            settings,
            host,
            factory,
        }
    }

    /// Settings of the tenant being set up.
    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    /// Run setup. Returns the recipe's execution id.
    pub async fn setup(&self, context: SetupContext) -> Result<Option<String>, HostError> {
        let initial_state = self.settings.state();

        let result = if RestartQueue::current().is_some() {
            self.setup_internal(context).await
        } else {
            self.host
                .scope(self.setup_internal(context))
                .await
                .and_then(|result| result)
        };

        if result.is_err() {
            self.settings.set_state(initial_state);
        }
        result
    }

    async fn setup_internal(&self, context: SetupContext) -> Result<Option<String>, HostError> {
        info!(tenant = self.settings.name(), "Running setup for tenant");

        let requested: Vec<ShellFeature> = features::SETUP_MANDATORY
            .iter()
            .map(|name| ShellFeature::from(*name))
            .chain(context.enabled_features.iter().map(ShellFeature::new))
            .collect();

        self.settings.set_state(TenantState::Initializing);

        let settings = self.settings.fork();
        if !settings.store().is_configured() {
            settings.set_store(StoreConnection {
                database_provider: context.database_provider.clone(),
                connection_string: context.connection_string.clone(),
                table_prefix: context.table_prefix.clone(),
            });
        }

        let descriptor = ShellDescriptor::new(
            UNCONFIGURED_SERIAL_NUMBER,
            requested,
            context.parameters.clone(),
        );
        let setup_shell = self
            .factory
            .create_described_context(&settings, &descriptor)
            .map_err(|e| HostError::from_build(settings.name(), e))?;
        let written = write_initial_descriptor(&setup_shell, &descriptor).await;
        setup_shell.dispose();
        let written = written?;
        debug!(tenant = settings.name(), serial = written.serial_number, "Initial descriptor written");

        let tenant_shell = self.host.create_shell_context(&settings).await?;
        let execution = create_tenant_data(&tenant_shell, &context.recipe).await;
        tenant_shell.dispose();
        let execution_id = execution?;

        settings.set_state(TenantState::Running);
        self.host.update_shell_settings(&settings).await?;
        self.host.start_updated_shells().await?;

        info!(tenant = settings.name(), "Setup complete");
        Ok(execution_id)
    }
}

async fn write_initial_descriptor(
    shell: &ShellContext,
    descriptor: &ShellDescriptor,
) -> Result<ShellDescriptor, HostError> {
    let scope = shell.create_service_scope()?;
    let store = scope.require::<dyn DescriptorStoreApi>()?;
    let written = store
        .update_descriptor(
            UNCONFIGURED_SERIAL_NUMBER,
            descriptor.features.clone(),
            descriptor.parameters.clone(),
        )
        .await?;
    Ok(written)
}

async fn create_tenant_data(shell: &ShellContext, recipe: &Recipe) -> Result<Option<String>, HostError> {
    let scope = shell.create_service_scope()?;
    let executor = RecipeExecutor::from_scope(&scope)?;
    let span = scope
        .resolve::<TenantLog>()
        .map_or_else(Span::none, |log| log.span().clone());

    Ok(executor.execute(recipe).instrument(span).await?)
}
