//! # Shell Descriptor
//!
//! Versioned record of a tenant's enabled features and parameters.
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Monotonic serial | Every successful update stores `prior + 1` |
//! | Unique features | A feature name appears at most once, first occurrence wins |
//! | Unique parameters | A `(component, name)` pair appears at most once |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Serial number carried by descriptors that were never persisted.
pub const BOOTSTRAP_SERIAL_NUMBER: i64 = -1;

/// Serial number of a tenant that has no persisted descriptor yet.
///
/// The first update must name this as its prior serial number.
pub const UNCONFIGURED_SERIAL_NUMBER: i64 = 0;

/// Well-known feature names.
pub mod features {
    pub const LOGGING: &str = "logging";
    pub const HOSTING: &str = "hosting";
    pub const SETTINGS: &str = "settings";
    pub const SETUP: &str = "setup";
    pub const RECIPES: &str = "recipes";
    pub const MODULES: &str = "modules";
    pub const THEMES: &str = "themes";

    /// Minimal set able to resolve the descriptor store of a tenant.
    pub const BOOTSTRAP: [&str; 3] = [LOGGING, HOSTING, SETTINGS];

    /// Set used by the shell that runs first-time setup.
    pub const SETUP_SHELL: [&str; 3] = [LOGGING, SETUP, RECIPES];

    /// Features always enabled by a completed setup.
    pub const SETUP_MANDATORY: [&str; 6] = [LOGGING, HOSTING, SETTINGS, MODULES, THEMES, RECIPES];
}

/// An enabled feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShellFeature {
    pub name: String,
}

impl ShellFeature {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&str> for ShellFeature {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A configuration value addressed to one component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShellParameter {
    pub component: String,
    pub name: String,
    pub value: String,
}

impl ShellParameter {
    pub fn new(
        component: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Versioned description of what a tenant's shell is made of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellDescriptor {
    pub serial_number: i64,
    pub features: Vec<ShellFeature>,
    #[serde(default)]
    pub parameters: Vec<ShellParameter>,
}

impl ShellDescriptor {
    /// Create a descriptor, dropping duplicate features and parameters.
    pub fn new(
        serial_number: i64,
        features: impl IntoIterator<Item = ShellFeature>,
        parameters: impl IntoIterator<Item = ShellParameter>,
    ) -> Self {
        Self {
            serial_number,
            features: dedup_features(features),
            parameters: dedup_parameters(parameters),
        }
    }

    /// Descriptor of the reduced shell used to read the real descriptor.
    #[must_use]
    pub fn bootstrap() -> Self {
        Self::new(
            BOOTSTRAP_SERIAL_NUMBER,
            features::BOOTSTRAP.iter().map(|name| ShellFeature::from(*name)),
            Vec::new(),
        )
    }

    /// Descriptor of the shell that runs first-time setup.
    #[must_use]
    pub fn setup() -> Self {
        Self::new(
            BOOTSTRAP_SERIAL_NUMBER,
            features::SETUP_SHELL.iter().map(|name| ShellFeature::from(*name)),
            Vec::new(),
        )
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|feature| feature.name.as_str())
    }

    #[must_use]
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|feature| feature.name == name)
    }

    /// Value of a parameter, if set.
    #[must_use]
    pub fn parameter(&self, component: &str, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.component == component && p.name == name)
            .map(|p| p.value.as_str())
    }
}

fn dedup_features(features: impl IntoIterator<Item = ShellFeature>) -> Vec<ShellFeature> {
    let mut seen = HashSet::new();
    features
        .into_iter()
        .filter(|feature| seen.insert(feature.name.clone()))
        .collect()
}

fn dedup_parameters(parameters: impl IntoIterator<Item = ShellParameter>) -> Vec<ShellParameter> {
    let mut seen = HashSet::new();
    parameters
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_features_dropped_in_order() {
        let descriptor = ShellDescriptor::new(
            3,
            ["b", "a", "b", "c", "a"].into_iter().map(ShellFeature::from),
            Vec::new(),
        );

        let names: Vec<_> = descriptor.feature_names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_only_identical_parameters_collapse() {
        let descriptor = ShellDescriptor::new(
            1,
            Vec::new(),
            vec![
                ShellParameter::new("cache", "size", "10"),
                ShellParameter::new("cache", "size", "20"),
                ShellParameter::new("cache", "size", "10"),
                ShellParameter::new("cache", "ttl", "5"),
            ],
        );

        assert_eq!(
            descriptor.parameters,
            vec![
                ShellParameter::new("cache", "size", "10"),
                ShellParameter::new("cache", "size", "20"),
                ShellParameter::new("cache", "ttl", "5"),
            ]
        );
        assert_eq!(descriptor.parameter("cache", "size"), Some("10"));
        assert_eq!(descriptor.parameter("cache", "missing"), None);
    }

    #[test]
    fn test_bootstrap_descriptor() {
        let descriptor = ShellDescriptor::bootstrap();
        assert_eq!(descriptor.serial_number, BOOTSTRAP_SERIAL_NUMBER);
        assert_eq!(
            descriptor.feature_names().collect::<Vec<_>>(),
            vec!["logging", "hosting", "settings"]
        );
        assert!(descriptor.parameters.is_empty());
    }

    #[test]
    fn test_setup_descriptor_has_setup_feature() {
        let descriptor = ShellDescriptor::setup();
        assert!(descriptor.has_feature(features::SETUP));
        assert!(!descriptor.has_feature(features::SETTINGS));
    }
}
