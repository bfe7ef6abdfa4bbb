//! # Catalog Composition
//!
//! Composes blueprints by expanding descriptor features against a
//! `FeatureCatalog`.

use std::sync::Arc;

use shared_types::{ShellDescriptor, ShellSettings};
use tracing::debug;

use crate::domain::blueprint::ShellBlueprint;
use crate::domain::catalog::{CatalogError, FeatureCatalog};
use crate::domain::errors::BuildError;
use crate::ports::outbound::CompositionStrategy;

pub struct CatalogCompositionStrategy {
    catalog: Arc<FeatureCatalog>,
}

impl CatalogCompositionStrategy {
    pub fn new(catalog: Arc<FeatureCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }
}

impl CompositionStrategy for CatalogCompositionStrategy {
    fn compose(
        &self,
        settings: &ShellSettings,
        descriptor: &ShellDescriptor,
    ) -> Result<ShellBlueprint, BuildError> {
        let features = self
            .catalog
            .expand(descriptor.feature_names())
            .map_err(|e| BuildError::Composition {
                tenant: settings.name().to_string(),
                reason: match e {
                    CatalogError::Unknown(name) => format!("unknown feature '{name}'"),
                    CatalogError::Cycle(name) => format!("dependency cycle through '{name}'"),
                },
            })?;

        debug!(tenant = settings.name(), features = ?features, "Composed blueprint");

        Ok(ShellBlueprint {
            tenant: settings.name().to_string(),
            descriptor: descriptor.clone(),
            features,
        })
    }
}
