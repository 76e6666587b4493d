use std::{path::PathBuf, str::FromStr};

use clap::Parser;

use strum::Display;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source framework.
    /// Supported frameworks: tensorflow, onnx
    /// Default: tensorflow
    #[arg(short, long, default_value = "tensorflow")]
    pub framework: FrameworkName,

    /// Prost-encoded canonical op descriptor list.
    /// Example: --descriptors /path/to/nd4j-op-def.pb
    #[arg(short, long)]
    pub descriptors: PathBuf,

    /// Prost-encoded op definitions of the source framework
    /// (a TensorFlow OpList, or an ONNX GraphProto of op schemas).
    /// Example: --op-defs /path/to/ops.pb
    #[arg(short, long)]
    pub op_defs: PathBuf,

    /// Lists the ops known to the source framework and exits.
    #[arg(short, long)]
    pub list: bool,

    /// Source op and canonical op of the mapping to inspect, in the format source:canonical.
    /// Example: --mapping Add:add
    #[arg(short, long)]
    pub mapping: Option<OpPair>,

    /// Argument names to classify against the mapping.
    /// Example: --name x --name input
    #[arg(short, long)]
    pub name: Vec<String>,

    /// Prost-encoded tensor of the source framework to convert.
    /// Example: --tensor /path/to/tensor.pb
    #[arg(short, long)]
    pub tensor: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct OpPair {
    pub source: String,
    pub canonical: String,
}

impl FromStr for OpPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, canonical) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid op mapping, expected source:canonical: {}", s))?;
        if source.is_empty() || canonical.is_empty() {
            return Err(format!("Invalid op mapping: {}", s));
        }
        Ok(Self {
            source: source.to_string(),
            canonical: canonical.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Display)]
pub enum FrameworkName {
    #[strum(serialize = "tensorflow")]
    Tensorflow,
    #[strum(serialize = "onnx")]
    Onnx,
}

impl FromStr for FrameworkName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tensorflow" | "tf" => Ok(Self::Tensorflow),
            "onnx" => Ok(Self::Onnx),
            _ => Err(format!("Invalid framework name: {}", s)),
        }
    }
}
