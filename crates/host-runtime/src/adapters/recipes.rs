//! # Logging Recipe Manager
//!
//! Walks a recipe's steps and records each one. Step semantics belong to
//! the features that implement them; this manager only sequences them.

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::RecipeError;
use crate::ports::{Recipe, RecipeManager};

#[derive(Debug, Default)]
pub struct LoggingRecipeManager;

impl LoggingRecipeManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecipeManager for LoggingRecipeManager {
    async fn execute(&self, recipe: &Recipe) -> Result<Option<String>, RecipeError> {
        if recipe.steps.is_empty() {
            debug!(recipe = %recipe.name, "Recipe has no steps");
            return Ok(None);
        }

        let execution_id = Uuid::new_v4().simple().to_string();
        info!(recipe = %recipe.name, execution_id = %execution_id, "Executing recipe");
        for (index, step) in recipe.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                return Err(RecipeError::StepFailed {
                    recipe: recipe.name.clone(),
                    step: format!("#{index}"),
                    reason: "step has no name".into(),
                });
            }
            debug!(execution_id = %execution_id, step = %step.name, "Recipe step executed");
        }
        Ok(Some(execution_id))
    }
}
