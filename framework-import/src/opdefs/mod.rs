//! # Op descriptors
//!
//! Catalogs of op definitions, the loaders (one per framework) that provide them, and the
//! [`OpDescriptorRegistry`] aggregating the loaders.
mod catalog;
mod loader;
mod registry;

pub use catalog::*;
pub use loader::*;
pub use registry::*;
