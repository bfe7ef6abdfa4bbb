//! # Host Container
//!
//! Configuration and the assembled set of host components.
//!
//! ## Assembly Order
//!
//! 1. Event bus
//! 2. Settings manager and descriptor repository (publish on the bus)
//! 3. Feature modules → container factory → shell factory
//! 4. Routing table and shell host
//! 5. Host subscribed to bus notifications

pub mod components;
pub mod config;

pub use components::HostComponents;
pub use config::{ConfigError, HostConfig};
