//!
//! # Canonical IR
//!
//! Framework-agnostic op descriptors and tensors every import is translated into.
//!
mod descriptor;
mod tensor;

pub use descriptor::*;
pub use tensor::*;
