//! # Module Container Factory
//!
//! Builds containers by running the feature module of every blueprint
//! feature, in blueprint order. Features without a module contribute no
//! services.

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::ShellSettings;
use tracing::debug;

use crate::container::{ContainerBuilder, ShellContainer};
use crate::domain::blueprint::ShellBlueprint;
use crate::domain::errors::BuildError;
use crate::ports::outbound::{ContainerFactory, FeatureModule, ModuleContext};

#[derive(Default)]
pub struct ModuleContainerFactory {
    modules: HashMap<String, Arc<dyn FeatureModule>>,
}

impl ModuleContainerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module for its feature, replacing any previous one.
    #[must_use]
    pub fn with_module(mut self, module: Arc<dyn FeatureModule>) -> Self {
        self.modules.insert(module.feature().to_string(), module);
        self
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

impl ContainerFactory for ModuleContainerFactory {
    fn create_container(
        &self,
        settings: &ShellSettings,
        blueprint: &ShellBlueprint,
    ) -> Result<ShellContainer, BuildError> {
        let mut builder = ContainerBuilder::new(settings.name());
        let context = ModuleContext { settings, blueprint };

        for feature in &blueprint.features {
            if let Some(module) = self.modules.get(feature) {
                debug!(tenant = settings.name(), feature = %feature, "Configuring feature module");
                // A failing module drops the builder; resources registered so
                // far are never handed to a container.
                module.configure(&mut builder, &context)?;
            }
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ShellDescriptor, TenantState};

    struct Marker(&'static str);

    struct MarkerModule(&'static str);

    impl FeatureModule for MarkerModule {
        fn feature(&self) -> &str {
            self.0
        }

        fn configure(
            &self,
            builder: &mut ContainerBuilder,
            _context: &ModuleContext<'_>,
        ) -> Result<(), BuildError> {
            builder.add_singleton(Arc::new(Marker(self.0)));
            Ok(())
        }
    }

    struct FailingModule;

    impl FeatureModule for FailingModule {
        fn feature(&self) -> &str {
            "hosting"
        }

        fn configure(
            &self,
            builder: &mut ContainerBuilder,
            _context: &ModuleContext<'_>,
        ) -> Result<(), BuildError> {
            Err(BuildError::Container {
                tenant: builder.tenant().to_string(),
                reason: "hosting unavailable".into(),
            })
        }
    }

    fn blueprint(features: &[&str]) -> ShellBlueprint {
        ShellBlueprint {
            tenant: "alpha".into(),
            descriptor: ShellDescriptor::default(),
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_modules_run_in_blueprint_order() {
        let factory = ModuleContainerFactory::new()
            .with_module(Arc::new(MarkerModule("logging")))
            .with_module(Arc::new(MarkerModule("hosting")));
        let settings = ShellSettings::new("alpha", TenantState::Running).unwrap();

        let container = factory
            .create_container(&settings, &blueprint(&["logging", "hosting"]))
            .unwrap();

        // The later module's registration wins.
        assert_eq!(container.resolve::<Marker>().unwrap().0, "hosting");
    }

    #[test]
    fn test_module_failure_propagates() {
        let factory = ModuleContainerFactory::new()
            .with_module(Arc::new(MarkerModule("logging")))
            .with_module(Arc::new(FailingModule));
        let settings = ShellSettings::new("alpha", TenantState::Running).unwrap();

        let err = factory
            .create_container(&settings, &blueprint(&["logging", "hosting"]))
            .err()
            .unwrap();
        assert!(matches!(err, BuildError::Container { .. }));
    }
}
