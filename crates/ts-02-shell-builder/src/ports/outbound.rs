//! # Outbound Ports (Driven Ports)
//!
//! Composition strategy, container factory, and the feature modules that
//! contribute services to a container.

use shared_types::{ShellDescriptor, ShellSettings};

use crate::container::{ContainerBuilder, ShellContainer};
use crate::domain::blueprint::ShellBlueprint;
use crate::domain::errors::BuildError;

/// Turns a descriptor into a blueprint.
pub trait CompositionStrategy: Send + Sync {
    fn compose(
        &self,
        settings: &ShellSettings,
        descriptor: &ShellDescriptor,
    ) -> Result<ShellBlueprint, BuildError>;
}

/// Builds the service container described by a blueprint.
pub trait ContainerFactory: Send + Sync {
    fn create_container(
        &self,
        settings: &ShellSettings,
        blueprint: &ShellBlueprint,
    ) -> Result<ShellContainer, BuildError>;
}

/// What a feature module sees while configuring a container.
pub struct ModuleContext<'a> {
    pub settings: &'a ShellSettings,
    pub blueprint: &'a ShellBlueprint,
}

/// Services contributed by one feature.
pub trait FeatureModule: Send + Sync {
    /// Feature this module implements.
    fn feature(&self) -> &str;

    fn configure(
        &self,
        builder: &mut ContainerBuilder,
        context: &ModuleContext<'_>,
    ) -> Result<(), BuildError>;
}
