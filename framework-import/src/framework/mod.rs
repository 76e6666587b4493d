//! # Frameworks
//!
//! A [`Framework`] tells the importer how to read a source framework's graphs, nodes and tensors.
//! Mapping rules are generic over it, so the same rule families serve every framework.
mod onnx;
mod tensorflow;

pub use onnx::*;
pub use tensorflow::*;

use std::collections::HashMap;

use crate::{
    error::Result,
    ir,
    opdefs::FrameworkOpDef,
    rule::MappingContext,
};

pub trait Framework: Send + Sync + 'static {
    /// Name the framework's loader is registered under.
    const NAME: &'static str;

    type Graph: Sync;
    type Node: Sync;
    type Tensor: Clone + Send + Sync;

    /// Structural conversion of a native tensor into the canonical representation.
    fn convert_tensor(tensor: &Self::Tensor) -> Result<ir::TensorProto>;

    fn nodes(graph: &Self::Graph) -> &[Self::Node];

    fn node_name(node: &Self::Node) -> &str;

    fn node_op(node: &Self::Node) -> &str;

    /// Names of the values a node consumes, control dependencies included.
    fn node_inputs(node: &Self::Node) -> Vec<String>;

    /// Names of the values a node produces.
    fn node_outputs(node: &Self::Node) -> Vec<String>;

    /// Constant tensors of the graph, keyed by value name.
    fn graph_constants(graph: &Self::Graph) -> HashMap<String, Self::Tensor>;

    /// Binds the node's constant inputs to the argument names declared by `op_def`
    /// and reads its attributes.
    fn mapping_context(
        node: &Self::Node,
        op_def: &FrameworkOpDef,
        constants: &HashMap<String, Self::Tensor>,
    ) -> Result<MappingContext<Self::Tensor>>;
}
