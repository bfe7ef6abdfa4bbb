//! # Descriptor Store (ts-01)
//!
//! Persists and retrieves a tenant's shell descriptor with optimistic
//! concurrency, and notifies subscribers after every successful update.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Serial Monotonicity | A successful update stores `prior + 1` |
//! | 2 | Stale Writes Rejected | A wrong prior serial fails and changes nothing |
//! | 3 | Wholesale Replacement | Features and parameters are replaced, never merged |
//! | 4 | Post-Commit Notification | `DescriptorChanged` is published only after the save |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors and per-tenant update serialization
//! - `ports/` - Inbound API trait, outbound repository trait
//! - `adapters/` - JSON file repository
//! - `service.rs` - `DescriptorStore` implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! let store = DescriptorStore::new("alpha", repository, bus, locks);
//! let current = store.get_descriptor().await?;
//! let prior = current.map_or(0, |d| d.serial_number);
//! store.update_descriptor(prior, features, parameters).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::FileDescriptorRepository;
pub use domain::errors::{RepositoryError, StoreError};
pub use domain::locks::TenantLocks;
pub use ports::inbound::DescriptorStoreApi;
pub use ports::outbound::{DescriptorRepository, InMemoryDescriptorRepository};
pub use service::DescriptorStore;
