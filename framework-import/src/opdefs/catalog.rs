use std::collections::{HashMap, HashSet};

use crate::{
    error::{ImportError, NotFoundKind, Result},
    ir::{ArgType, OpDescriptor, OpDescriptorList},
    onnx_format, tensorflow_format,
};

/// An op definition in the native shape of its framework.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameworkOpDef {
    Tensorflow(tensorflow_format::OpDef),
    /// ONNX schemas are described as nodes whose inputs are the declared argument names.
    Onnx(onnx_format::NodeProto),
}

impl FrameworkOpDef {
    pub fn name(&self) -> &str {
        match self {
            FrameworkOpDef::Tensorflow(op) => &op.name,
            FrameworkOpDef::Onnx(node) => node.op_type(),
        }
    }

    /// Declared input argument names, in framework order.
    pub fn input_arg_names(&self) -> Vec<&str> {
        match self {
            FrameworkOpDef::Tensorflow(op) => op.input_arg.iter().map(|a| a.name.as_str()).collect(),
            FrameworkOpDef::Onnx(node) => node.input.iter().map(String::as_str).collect(),
        }
    }

    pub fn output_arg_names(&self) -> Vec<&str> {
        match self {
            FrameworkOpDef::Tensorflow(op) => {
                op.output_arg.iter().map(|a| a.name.as_str()).collect()
            }
            FrameworkOpDef::Onnx(node) => node.output.iter().map(String::as_str).collect(),
        }
    }

    pub fn as_tensorflow(&self) -> Option<&tensorflow_format::OpDef> {
        match self {
            FrameworkOpDef::Tensorflow(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_onnx(&self) -> Option<&onnx_format::NodeProto> {
        match self {
            FrameworkOpDef::Onnx(node) => Some(node),
            _ => None,
        }
    }
}

/// The ops a single framework knows about, keyed by op name.
#[derive(Debug, Clone)]
pub struct OpDescriptorCatalog {
    framework: String,
    ops: HashMap<String, FrameworkOpDef>,
}

impl OpDescriptorCatalog {
    /// Builds a catalog, rejecting two definitions with the same op name.
    pub fn new<I>(framework: impl Into<String>, ops: I) -> Result<Self>
    where
        I: IntoIterator<Item = FrameworkOpDef>,
    {
        let framework = framework.into();
        let mut by_name = HashMap::new();
        for op in ops {
            let name = op.name().to_string();
            if by_name.insert(name.clone(), op).is_some() {
                return Err(ImportError::Configuration(format!(
                    "op {} is defined twice in the {} catalog",
                    name, framework
                )));
            }
        }

        Ok(Self {
            framework,
            ops: by_name,
        })
    }

    pub fn framework(&self) -> &str {
        &self.framework
    }

    pub fn get(&self, op_name: &str) -> Option<&FrameworkOpDef> {
        self.ops.get(op_name)
    }

    /// Like [`get`](Self::get), failing with a `NotFound` error naming the op.
    pub fn find_op(&self, op_name: &str) -> Result<&FrameworkOpDef> {
        self.get(op_name)
            .ok_or_else(|| ImportError::not_found(NotFoundKind::Op, op_name))
    }

    pub fn contains(&self, op_name: &str) -> bool {
        self.ops.contains_key(op_name)
    }

    pub fn tensorflow_op(&self, op_name: &str) -> Option<&tensorflow_format::OpDef> {
        self.get(op_name).and_then(FrameworkOpDef::as_tensorflow)
    }

    pub fn onnx_op(&self, op_name: &str) -> Option<&onnx_format::NodeProto> {
        self.get(op_name).and_then(FrameworkOpDef::as_onnx)
    }

    pub fn op_names(&self) -> Vec<&str> {
        let mut names = self.ops.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Indexed, validated view of the canonical descriptor list.
#[derive(Debug, Clone, Default)]
pub struct CanonicalCatalog {
    list: OpDescriptorList,
    index: HashMap<String, usize>,
}

impl CanonicalCatalog {
    /// Validates that op names are unique and that, inside each op,
    /// argument names are unique per argument kind.
    pub fn new(list: OpDescriptorList) -> Result<Self> {
        let mut index = HashMap::new();
        for (position, op) in list.op_list.iter().enumerate() {
            if index.insert(op.name.clone(), position).is_some() {
                return Err(ImportError::Configuration(format!(
                    "canonical op {} is declared twice",
                    op.name
                )));
            }
            validate_arg_names(op)?;
        }

        Ok(Self { list, index })
    }

    pub fn find_op(&self, op_name: &str) -> Result<&OpDescriptor> {
        self.get(op_name)
            .ok_or_else(|| ImportError::not_found(NotFoundKind::CanonicalOp, op_name))
    }

    pub fn get(&self, op_name: &str) -> Option<&OpDescriptor> {
        self.index.get(op_name).map(|i| &self.list.op_list[*i])
    }

    pub fn contains(&self, op_name: &str) -> bool {
        self.index.contains_key(op_name)
    }

    pub fn ops(&self) -> &[OpDescriptor] {
        &self.list.op_list
    }

    pub fn as_list(&self) -> &OpDescriptorList {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.op_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.op_list.is_empty()
    }
}

fn validate_arg_names(op: &OpDescriptor) -> Result<()> {
    let mut seen: HashSet<(i32, &str)> = HashSet::new();
    for arg in &op.arg_descriptor {
        if ArgType::try_from(arg.arg_type).is_err() {
            return Err(ImportError::Configuration(format!(
                "argument {} of {} has unknown type tag {}",
                arg.name, op.name, arg.arg_type
            )));
        }
        if !seen.insert((arg.arg_type, arg.name.as_str())) {
            return Err(ImportError::Configuration(format!(
                "argument {} is declared twice as {:?} in {}",
                arg.name,
                arg.arg_type(),
                op.name
            )));
        }
    }
    Ok(())
}
