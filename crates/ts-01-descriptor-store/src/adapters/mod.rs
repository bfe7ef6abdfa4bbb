//! # Adapters
//!
//! Concrete persistence backends.

pub mod file;

pub use file::FileDescriptorRepository;
