//! # Feature Catalog
//!
//! The features a host knows about and what each one depends on.
//! Composition expands a descriptor's enabled features into a
//! dependency-first order before the container is built.

use std::collections::{HashMap, HashSet};

use shared_types::features;

/// A feature available to tenants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    pub name: String,
    pub dependencies: Vec<String>,
    pub description: String,
}

impl FeatureInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Why a feature list could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Unknown(String),
    Cycle(String),
}

/// Registry of known features.
#[derive(Debug, Clone, Default)]
pub struct FeatureCatalog {
    features: HashMap<String, FeatureInfo>,
}

impl FeatureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the host's built-in features.
    #[must_use]
    pub fn with_core_features() -> Self {
        let mut catalog = Self::new();
        catalog.register(FeatureInfo::new(features::LOGGING).described("Structured logging"));
        catalog.register(
            FeatureInfo::new(features::HOSTING)
                .depends_on(features::LOGGING)
                .described("Tenant hosting services"),
        );
        catalog.register(
            FeatureInfo::new(features::SETTINGS)
                .depends_on(features::HOSTING)
                .described("Descriptor store and site settings"),
        );
        catalog.register(
            FeatureInfo::new(features::RECIPES)
                .depends_on(features::LOGGING)
                .described("Recipe execution"),
        );
        catalog.register(
            FeatureInfo::new(features::SETUP)
                .depends_on(features::RECIPES)
                .described("First-time tenant setup"),
        );
        catalog.register(
            FeatureInfo::new(features::MODULES)
                .depends_on(features::SETTINGS)
                .described("Feature management"),
        );
        catalog.register(
            FeatureInfo::new(features::THEMES)
                .depends_on(features::SETTINGS)
                .described("Theme selection"),
        );
        catalog
    }

    /// Register or replace a feature.
    pub fn register(&mut self, feature: FeatureInfo) {
        self.features.insert(feature.name.clone(), feature);
    }

    pub fn get(&self, name: &str) -> Option<&FeatureInfo> {
        self.features.get(name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Expand `enabled` with its transitive dependencies, dependencies first.
    ///
    /// Order among unrelated features follows the order of `enabled`.
    pub fn expand<'a>(
        &self,
        enabled: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<String>, CatalogError> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut in_progress = HashSet::new();

        for name in enabled {
            self.visit(name, &mut done, &mut in_progress, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        done: &mut HashSet<String>,
        in_progress: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<(), CatalogError> {
        if done.contains(name) {
            return Ok(());
        }
        if !in_progress.insert(name.to_string()) {
            return Err(CatalogError::Cycle(name.to_string()));
        }

        let feature = self
            .features
            .get(name)
            .ok_or_else(|| CatalogError::Unknown(name.to_string()))?;
        for dependency in &feature.dependencies {
            self.visit(dependency, done, in_progress, order)?;
        }

        in_progress.remove(name);
        done.insert(name.to_string());
        order.push(name.to_string());
        Ok(())
    }
}
