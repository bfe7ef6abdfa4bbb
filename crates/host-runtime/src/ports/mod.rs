//! # Ports
//!
//! Collaborators the host consumes but does not own.
//!
//! - `ShellSettingsManager` - where tenant settings live
//! - `RunningShellTable` - request routing to activated tenants
//! - `RecipeManager` - runs recipes inside a shell

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::ShellSettings;

use crate::errors::{RecipeError, SettingsError};

/// Store of every tenant's settings.
#[async_trait]
pub trait ShellSettingsManager: Send + Sync {
    /// Every known tenant, freshly loaded.
    async fn load_settings(&self) -> Result<Vec<ShellSettings>, SettingsError>;

    /// Persist `settings` and publish `SettingsSaved`.
    async fn save_settings(&self, settings: &ShellSettings) -> Result<(), SettingsError>;
}

/// Routing table of activated tenants.
pub trait RunningShellTable: Send + Sync {
    fn add(&self, settings: &ShellSettings);

    fn update(&self, settings: &ShellSettings);

    fn remove(&self, tenant: &str);

    /// Tenant serving a request for `host` and `path`.
    fn match_request(&self, host: &str, path: &str) -> Option<ShellSettings>;
}

/// One step of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A named list of steps that configures a tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_setup_recipe: bool,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_step(mut self, name: impl Into<String>, data: serde_json::Value) -> Self {
        self.steps.push(RecipeStep {
            name: name.into(),
            data,
        });
        self
    }
}

/// Executes recipes.
#[async_trait]
pub trait RecipeManager: Send + Sync {
    /// Run `recipe`. Returns the execution id, or `None` when there was
    /// nothing to do.
    async fn execute(&self, recipe: &Recipe) -> Result<Option<String>, RecipeError>;
}
