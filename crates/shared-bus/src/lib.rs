//! # Shared Bus - Host Notification Dispatch
//!
//! A tagged dispatch table mapping each event topic to an ordered set of
//! handler closures.
//!
//! ## Delivery Rules
//!
//! - Handlers run synchronously on the publishing task, in subscription order
//! - A failing or panicking handler is logged and skipped; the remaining
//!   handlers still run and the publisher never sees the failure
//! - Dropping a `Subscription` removes its handler
//!
//! ```text
//! ┌──────────────────┐   publish()   ┌────────────────────────────┐
//! │ Descriptor Store │ ────────────→ │ DescriptorChanged: [h1,h2] │
//! │ Settings Manager │ ────────────→ │ SettingsSaved:     [h3]    │
//! └──────────────────┘               └────────────────────────────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventTopic, HostEvent};
pub use publisher::{EventPublisher, InMemoryEventBus, PublishReport};
pub use subscriber::{HandlerError, HandlerFn, Subscription};
