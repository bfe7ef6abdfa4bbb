//! # Shell Builder (ts-02)
//!
//! Builds the per-tenant service container ("shell") from settings and a
//! descriptor.
//!
//! ## Two-Phase Build
//!
//! A tenant's feature set is itself configuration that can only be read
//! through a container built from that configuration. The factory breaks the
//! circle with a reduced shell:
//!
//! ```text
//! bootstrap descriptor ──compose──→ reduced shell ──resolve──→ Descriptor Store
//!                                        │                          │
//!                                        │                  persisted descriptor
//!                                        │                          │
//!          none, or same serial ←────────┴──────────→ newer serial: dispose reduced,
//!          keep reduced shell                          build full shell
//! ```
//!
//! ## Crate Structure
//!
//! - `domain/` - Blueprint, feature catalog, errors
//! - `container/` - Capability-keyed service container and nested scopes
//! - `ports/` - Factory API, composition and container-factory ports
//! - `adapters/` - Catalog-driven composition, module-driven containers
//! - `shell.rs` - `ShellContext`, the disposable per-tenant aggregate
//! - `service.rs` - `DefaultShellContextFactory`

pub mod adapters;
pub mod container;
pub mod domain;
pub mod ports;
pub mod service;
pub mod shell;

pub use adapters::{CatalogCompositionStrategy, ModuleContainerFactory};
pub use container::{ContainerBuilder, Disposable, ServiceScope, ShellContainer};
pub use domain::blueprint::ShellBlueprint;
pub use domain::catalog::{FeatureCatalog, FeatureInfo};
pub use domain::errors::{BuildError, ShellError};
pub use ports::inbound::ShellContextFactory;
pub use ports::outbound::{CompositionStrategy, ContainerFactory, FeatureModule, ModuleContext};
pub use service::DefaultShellContextFactory;
pub use shell::ShellContext;
