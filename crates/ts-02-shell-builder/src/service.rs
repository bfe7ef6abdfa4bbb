//! # Shell Context Factory
//!
//! `DefaultShellContextFactory` composes blueprints through a
//! `CompositionStrategy` and materializes them through a `ContainerFactory`.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{ShellDescriptor, ShellSettings};
use tracing::{debug, info, instrument};
use ts_01_descriptor_store::DescriptorStoreApi;

use crate::domain::errors::BuildError;
use crate::ports::inbound::ShellContextFactory;
use crate::ports::outbound::{CompositionStrategy, ContainerFactory};
use crate::shell::ShellContext;

pub struct DefaultShellContextFactory {
    composition: Arc<dyn CompositionStrategy>,
    containers: Arc<dyn ContainerFactory>,
}

impl DefaultShellContextFactory {
    pub fn new(
        composition: Arc<dyn CompositionStrategy>,
        containers: Arc<dyn ContainerFactory>,
    ) -> Self {
        Self {
            composition,
            containers,
        }
    }
}

#[async_trait]
impl ShellContextFactory for DefaultShellContextFactory {
    #[instrument(skip_all, fields(tenant = settings.name()))]
    async fn create_shell_context(&self, settings: &ShellSettings) -> Result<ShellContext, BuildError> {
        debug!("Creating reduced shell from bootstrap descriptor");
        let reduced = self.create_described_context(settings, &ShellDescriptor::bootstrap())?;

        let persisted = match reduced.resolve::<dyn DescriptorStoreApi>() {
            Ok(store) => store.get_descriptor().await.map_err(BuildError::from),
            Err(e) => Err(BuildError::from(e)),
        };

        match persisted {
            Err(e) => {
                reduced.dispose();
                Err(e)
            }
            Ok(Some(descriptor)) if descriptor.serial_number != reduced.serial_number() => {
                info!(serial = descriptor.serial_number, "Rebuilding shell from persisted descriptor");
                reduced.dispose();
                self.create_described_context(settings, &descriptor)
            }
            Ok(_) => {
                debug!("No newer descriptor, keeping reduced shell");
                Ok(reduced)
            }
        }
    }

    fn create_described_context(
        &self,
        settings: &ShellSettings,
        descriptor: &ShellDescriptor,
    ) -> Result<ShellContext, BuildError> {
        debug!(
            tenant = settings.name(),
            serial = descriptor.serial_number,
            "Creating described shell"
        );
        let blueprint = self.composition.compose(settings, descriptor)?;
        let container = self.containers.create_container(settings, &blueprint)?;
        Ok(ShellContext::new(settings.clone(), blueprint, container))
    }
}
