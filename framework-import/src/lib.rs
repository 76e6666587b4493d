//! Maps operator and tensor definitions of external ML frameworks (TensorFlow, ONNX)
//! onto a canonical op descriptor IR.
pub mod error;
pub mod framework;
pub mod graph;
pub mod ir;
pub mod onnx_format;
pub mod opdefs;
pub mod process;
pub mod rule;
pub mod tensorflow_format;

pub use error::{ImportError, NotFoundKind, Result};
