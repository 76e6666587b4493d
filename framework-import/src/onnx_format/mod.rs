///
/// # ONNX Format
///
/// This module contains the ONNX format related code.
///
/// The ONNX format is defined in the [ONNX specification](https://github.com/onnx/onnx/blob/main/docs/IR.md).
/// Only the messages needed to describe nodes, attributes, initializers and op schemas are kept.
///
mod onnx_model;

pub use onnx_model::*;
