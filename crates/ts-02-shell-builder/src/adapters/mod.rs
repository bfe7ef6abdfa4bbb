//! # Adapters
//!
//! Default composition and container construction.

pub mod composition;
pub mod modules;

pub use composition::CatalogCompositionStrategy;
pub use modules::ModuleContainerFactory;
