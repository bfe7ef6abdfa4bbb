//! # Recipe Executor
//!
//! Runs a recipe inside a tenant's shell. A recipe that did work may have
//! changed what the tenant is made of, so the executor re-saves the current
//! descriptor under its own serial number: the store bumps the serial and
//! publishes `DescriptorChanged`, which schedules the tenant's restart.

use std::sync::Arc;

use tracing::{debug, info};
use ts_01_descriptor_store::DescriptorStoreApi;
use ts_02_shell_builder::{ServiceScope, ShellError};

use crate::errors::RecipeError;
use crate::ports::{Recipe, RecipeManager};

pub struct RecipeExecutor {
    manager: Arc<dyn RecipeManager>,
    store: Arc<dyn DescriptorStoreApi>,
}

impl RecipeExecutor {
    pub fn new(manager: Arc<dyn RecipeManager>, store: Arc<dyn DescriptorStoreApi>) -> Self {
        Self { manager, store }
    }

    /// Executor over the recipe manager and descriptor store of a shell scope.
    pub fn from_scope(scope: &ServiceScope) -> Result<Self, ShellError> {
        Ok(Self::new(
            scope.require::<dyn RecipeManager>()?,
            scope.require::<dyn DescriptorStoreApi>()?,
        ))
    }

    /// Run `recipe`, returning its execution id when it did work.
    pub async fn execute(&self, recipe: &Recipe) -> Result<Option<String>, RecipeError> {
        let execution_id = self.manager.execute(recipe).await?;

        if execution_id.is_some() {
            self.update_shell().await?;
        } else {
            debug!(recipe = %recipe.name, "Recipe did no work, descriptor left as is");
        }
        Ok(execution_id)
    }

    async fn update_shell(&self) -> Result<(), RecipeError> {
        let Some(current) = self.store.get_descriptor().await? else {
            debug!(tenant = self.store.tenant(), "No descriptor to refresh after recipe");
            return Ok(());
        };

        let updated = self
            .store
            .update_descriptor(current.serial_number, current.features, current.parameters)
            .await?;
        info!(
            tenant = self.store.tenant(),
            serial = updated.serial_number,
            "Descriptor refreshed after recipe"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LoggingRecipeManager;
    use serde_json::json;
    use shared_bus::{EventPublisher, InMemoryEventBus};
    use shared_types::ShellFeature;
    use ts_01_descriptor_store::{DescriptorStore, InMemoryDescriptorRepository, TenantLocks};

    fn executor() -> (RecipeExecutor, Arc<DescriptorStore>, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(DescriptorStore::new(
            "alpha",
            Arc::new(InMemoryDescriptorRepository::new()),
            bus.clone(),
            Arc::new(TenantLocks::new()),
        ));
        let executor = RecipeExecutor::new(Arc::new(LoggingRecipeManager::new()), store.clone());
        (executor, store, bus)
    }

    #[tokio::test]
    async fn test_recipe_with_work_bumps_serial() {
        let (executor, store, bus) = executor();
        store
            .update_descriptor(0, vec![ShellFeature::from("logging")], Vec::new())
            .await
            .unwrap();

        let id = executor
            .execute(&Recipe::new("blog").with_step("content", json!({})))
            .await
            .unwrap();

        assert!(id.is_some());
        let descriptor = store.get_descriptor().await.unwrap().unwrap();
        assert_eq!(descriptor.serial_number, 2);
        assert!(descriptor.has_feature("logging"));
        assert_eq!(bus.events_published(), 2);
    }

    #[tokio::test]
    async fn test_recipe_without_work_leaves_descriptor() {
        let (executor, store, bus) = executor();
        store
            .update_descriptor(0, vec![ShellFeature::from("logging")], Vec::new())
            .await
            .unwrap();

        assert_eq!(executor.execute(&Recipe::new("noop")).await.unwrap(), None);
        assert_eq!(store.get_descriptor().await.unwrap().unwrap().serial_number, 1);
        assert_eq!(bus.events_published(), 1);
    }
}
