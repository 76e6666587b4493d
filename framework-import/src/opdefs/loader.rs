use std::{fs::File, io::Read, path::Path, path::PathBuf};

use log::debug;
use prost::Message;

use crate::{
    error::{ImportError, Result},
    framework::{Framework, Onnx, Tensorflow},
    ir::OpDescriptorList,
    onnx_format::{GraphProto, NodeProto},
    tensorflow_format::OpList,
};

use super::{FrameworkOpDef, OpDescriptorCatalog};

/// A framework plugin: exposes the framework's own op catalog and the canonical ops it maps onto.
pub trait OpDescriptorLoader: Send + Sync {
    /// Name the framework is registered under.
    fn framework_name(&self) -> &str;

    /// The framework's own op definitions, keyed by op name.
    fn input_framework_op_descriptor_list(&self) -> Result<OpDescriptorCatalog>;

    /// The canonical op descriptors this plugin knows about.
    fn nd4j_op_list(&self) -> Result<OpDescriptorList>;
}

pub struct TensorflowOpDescriptorLoader {
    op_list: OpList,
    nd4j_ops: OpDescriptorList,
}

impl TensorflowOpDescriptorLoader {
    pub fn new(op_list: OpList, nd4j_ops: OpDescriptorList) -> Self {
        Self { op_list, nd4j_ops }
    }

    /// Reads a prost-encoded `OpList` and a prost-encoded canonical `OpDescriptorList`.
    pub fn from_files<P, Q>(op_defs: P, nd4j_ops: Q) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        Ok(Self::new(read_proto(op_defs)?, read_proto(nd4j_ops)?))
    }
}

impl OpDescriptorLoader for TensorflowOpDescriptorLoader {
    fn framework_name(&self) -> &str {
        Tensorflow::NAME
    }

    fn input_framework_op_descriptor_list(&self) -> Result<OpDescriptorCatalog> {
        OpDescriptorCatalog::new(
            Tensorflow::NAME,
            self.op_list.op.iter().cloned().map(FrameworkOpDef::Tensorflow),
        )
    }

    fn nd4j_op_list(&self) -> Result<OpDescriptorList> {
        Ok(self.nd4j_ops.clone())
    }
}

pub struct OnnxOpDescriptorLoader {
    schemas: Vec<NodeProto>,
    nd4j_ops: OpDescriptorList,
}

impl OnnxOpDescriptorLoader {
    /// Each schema is a node whose `op_type` is the op name and whose
    /// `input`/`output` lists are the declared argument names.
    pub fn new(schemas: Vec<NodeProto>, nd4j_ops: OpDescriptorList) -> Self {
        Self { schemas, nd4j_ops }
    }

    /// Reads the schemas from the nodes of a prost-encoded `GraphProto`.
    pub fn from_files<P, Q>(op_defs: P, nd4j_ops: Q) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let schemas: GraphProto = read_proto(op_defs)?;
        Ok(Self::new(schemas.node, read_proto(nd4j_ops)?))
    }
}

impl OpDescriptorLoader for OnnxOpDescriptorLoader {
    fn framework_name(&self) -> &str {
        Onnx::NAME
    }

    fn input_framework_op_descriptor_list(&self) -> Result<OpDescriptorCatalog> {
        if let Some(unnamed) = self.schemas.iter().position(|node| node.op_type.is_none()) {
            return Err(ImportError::Configuration(format!(
                "ONNX schema #{} has no op_type",
                unnamed
            )));
        }
        OpDescriptorCatalog::new(
            Onnx::NAME,
            self.schemas.iter().cloned().map(FrameworkOpDef::Onnx),
        )
    }

    fn nd4j_op_list(&self) -> Result<OpDescriptorList> {
        Ok(self.nd4j_ops.clone())
    }
}

/// Where the built-in loaders read their descriptors from.
#[derive(Clone, Debug, Default)]
pub struct LoaderConfig {
    pub nd4j_op_descriptors: Option<PathBuf>,
    pub tensorflow_op_defs: Option<PathBuf>,
    pub onnx_op_defs: Option<PathBuf>,
}

impl LoaderConfig {
    pub fn nd4j_op_descriptors(mut self, path: impl Into<PathBuf>) -> Self {
        self.nd4j_op_descriptors = Some(path.into());
        self
    }

    pub fn tensorflow_op_defs(mut self, path: impl Into<PathBuf>) -> Self {
        self.tensorflow_op_defs = Some(path.into());
        self
    }

    pub fn onnx_op_defs(mut self, path: impl Into<PathBuf>) -> Self {
        self.onnx_op_defs = Some(path.into());
        self
    }
}

/// The plugin list of this crate: one loader per framework whose op definitions are configured.
pub fn builtin_loaders(config: &LoaderConfig) -> Result<Vec<Box<dyn OpDescriptorLoader>>> {
    let mut loaders: Vec<Box<dyn OpDescriptorLoader>> = Vec::new();
    if config.tensorflow_op_defs.is_none() && config.onnx_op_defs.is_none() {
        return Ok(loaders);
    }

    let Some(nd4j_path) = &config.nd4j_op_descriptors else {
        return Err(ImportError::Configuration(String::from(
            "framework op definitions were given without the canonical op descriptors",
        )));
    };
    let nd4j_ops: OpDescriptorList = read_proto(nd4j_path)?;

    if let Some(path) = &config.tensorflow_op_defs {
        debug!("Loading TensorFlow op definitions from {:?}", path);
        loaders.push(Box::new(TensorflowOpDescriptorLoader::new(
            read_proto(path)?,
            nd4j_ops.clone(),
        )));
    }
    if let Some(path) = &config.onnx_op_defs {
        debug!("Loading ONNX op schemas from {:?}", path);
        let schemas: GraphProto = read_proto(path)?;
        loaders.push(Box::new(OnnxOpDescriptorLoader::new(
            schemas.node,
            nd4j_ops.clone(),
        )));
    }

    Ok(loaders)
}

/// Reads a prost-encoded message from the given path.
pub fn read_proto<M, P>(path: P) -> Result<M>
where
    M: Message + Default,
    P: AsRef<Path>,
{
    let mut buffer = Vec::new();
    let mut file = File::open(path)?;
    file.read_to_end(&mut buffer)?;

    Ok(M::decode(buffer.as_slice())?)
}
