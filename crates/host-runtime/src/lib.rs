//! # Host Runtime Library
//!
//! The shell host and everything it is wired from. The `host-runtime`
//! binary in `main.rs` is a thin entry point over this library.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and component assembly
//! - `host/` - `ShellHost`: startup fan-out, lookup, restart draining
//! - `registry/` - Tenant → current shell map
//! - `restart/` - Execution-scoped restart queue
//! - `wiring/` - Bus subscriptions feeding the restart queue
//! - `ports/` - Settings store, routing table, recipe manager
//! - `adapters/` - Port implementations
//! - `modules/` - Services contributed by each built-in feature
//! - `setup/` - First-time tenant setup
//! - `recipes/` - Recipe execution with descriptor refresh
//!
//! ## Restart Flow
//!
//! ```text
//! update_descriptor ──DescriptorChanged──→ ShellHost::on_descriptor_changed
//! save_settings ─────SettingsSaved──────→ ShellHost::on_settings_saved
//!                                                  │ (Running tenants only)
//!                                                  ↓
//!                                     RestartQueue (task-local, dedup by name)
//!                                                  │
//!                                   end of ShellHost::scope / start_updated_shells
//!                                                  ↓
//!                          rebuild → swap into registry → dispose previous shell
//! ```

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod errors;
pub mod host;
pub mod modules;
pub mod ports;
pub mod recipes;
pub mod registry;
pub mod restart;
pub mod setup;
pub mod wiring;

pub use container::{ConfigError, HostComponents, HostConfig};
pub use errors::{HostError, RecipeError, SettingsError};
pub use host::ShellHost;
pub use ports::{Recipe, RecipeManager, RecipeStep, RunningShellTable, ShellSettingsManager};
pub use recipes::RecipeExecutor;
pub use registry::ShellRegistry;
pub use restart::RestartQueue;
pub use setup::{SetupContext, SetupService};
