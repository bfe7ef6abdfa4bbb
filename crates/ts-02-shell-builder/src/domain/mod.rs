//! # Domain Layer

pub mod blueprint;
pub mod catalog;
pub mod errors;
