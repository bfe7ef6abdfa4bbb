//! # Ports
//!
//! - `inbound` - Shell factory API used by the host
//! - `outbound` - Composition and container construction the factory depends on

pub mod inbound;
pub mod outbound;
