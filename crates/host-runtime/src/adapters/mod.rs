//! # Adapters
//!
//! Port implementations used by the host binary and tests.

pub mod recipes;
pub mod routing;
pub mod settings;

pub use recipes::LoggingRecipeManager;
pub use routing::InMemoryRunningShellTable;
pub use settings::{FileShellSettingsManager, InMemoryShellSettingsManager};
