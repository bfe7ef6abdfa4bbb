//! # Ports
//!
//! - `inbound` - API offered to the host and to features
//! - `outbound` - Persistence the store depends on

pub mod inbound;
pub mod outbound;
