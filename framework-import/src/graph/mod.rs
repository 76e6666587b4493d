///
/// # Graph
///
/// This module maps whole source graphs onto canonical op descriptors: nodes are ordered by their
/// data dependencies, then each one is translated by the op mapping registered for its op type.
///
mod translator;
pub use translator::*;

use crate::ir::OpDescriptor;

/// A source node once mapped onto its canonical op.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedNode {
    pub node_name: String,
    /// Op type of the node in the source framework.
    pub input_framework_op_name: String,
    /// Names of the values the node consumes.
    pub inputs: Vec<String>,
    pub descriptor: OpDescriptor,
}

/// The mapped nodes of a graph, in topological order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedGraph {
    pub nodes: Vec<ImportedNode>,
}

impl ImportedGraph {
    pub fn node(&self, node_name: &str) -> Option<&ImportedNode> {
        self.nodes.iter().find(|node| node.node_name == node_name)
    }

    pub fn position(&self, node_name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.node_name == node_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportedNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
