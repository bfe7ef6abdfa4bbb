//! # Shared Types Crate
//!
//! Contains the tenant data model used by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `ShellSettings` and `ShellDescriptor` are defined here.
//! - **Shared Settings Handles**: cloning a `ShellSettings` shares its lifecycle
//!   state; use `ShellSettings::fork` for an independent copy.
//! - **Versioned Descriptors**: a descriptor's `serial_number` is the optimistic
//!   concurrency token for every update.

pub mod descriptor;
pub mod errors;
pub mod settings;

pub use descriptor::*;
pub use errors::*;
pub use settings::*;

/// Name of the tenant built when no tenant has been configured yet.
pub const DEFAULT_TENANT_NAME: &str = "Default";
