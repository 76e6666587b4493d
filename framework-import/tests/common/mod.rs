#![allow(dead_code)]

use std::sync::Arc;

use framework_import::{
    ir::{ArgDescriptor, ArgType, OpDescriptor, OpDescriptorList},
    onnx_format::{self, NodeProto},
    opdefs::{OnnxOpDescriptorLoader, OpDescriptorRegistry, TensorflowOpDescriptorLoader},
    tensorflow_format::{
        op_def::ArgDef, tensor_shape_proto::Dim, DataType, OpDef, OpList, TensorProto,
        TensorShapeProto,
    },
};

pub fn tf_op(name: &str, inputs: &[&str], outputs: &[&str]) -> OpDef {
    let arg = |name: &&str| ArgDef {
        name: name.to_string(),
        ..Default::default()
    };
    OpDef {
        name: String::from(name),
        input_arg: inputs.iter().map(arg).collect(),
        output_arg: outputs.iter().map(arg).collect(),
        ..Default::default()
    }
}

pub fn tf_op_list() -> OpList {
    OpList {
        op: vec![
            tf_op("Add", &["x", "y"], &["z"]),
            tf_op("Const", &[], &["output"]),
            tf_op("Relu", &["features"], &["activations"]),
            tf_op("Transpose", &["x", "perm"], &["y"]),
        ],
    }
}

/// Canonical ops: `add(input, y) -> output`, `relu(input) -> output`, `permute(input) -> output`.
pub fn nd4j_op_list() -> OpDescriptorList {
    OpDescriptorList::new(vec![
        OpDescriptor::new(
            "add",
            vec![
                ArgDescriptor::new("input", ArgType::InputTensor, 0),
                ArgDescriptor::new("y", ArgType::InputTensor, 1),
                ArgDescriptor::new("output", ArgType::OutputTensor, 0),
                ArgDescriptor::new("inPlace", ArgType::Bool, 0),
            ],
        ),
        OpDescriptor::new(
            "relu",
            vec![
                ArgDescriptor::new("input", ArgType::InputTensor, 0),
                ArgDescriptor::new("output", ArgType::OutputTensor, 0),
                ArgDescriptor::new("cutoff", ArgType::Double, 0),
            ],
        ),
        OpDescriptor::new(
            "permute",
            vec![
                ArgDescriptor::new("input", ArgType::InputTensor, 0),
                ArgDescriptor::new("output", ArgType::OutputTensor, 0),
                ArgDescriptor::new("permuteDims", ArgType::Int64, 0),
                ArgDescriptor::new("dataType", ArgType::DataType, 0),
            ],
        ),
    ])
}

pub fn tf_loader() -> TensorflowOpDescriptorLoader {
    TensorflowOpDescriptorLoader::new(tf_op_list(), nd4j_op_list())
}

pub fn onnx_schema(op_type: &str, inputs: &[&str], outputs: &[&str]) -> NodeProto {
    NodeProto {
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: outputs.iter().map(|s| s.to_string()).collect(),
        op_type: Some(String::from(op_type)),
        ..Default::default()
    }
}

pub fn onnx_loader() -> OnnxOpDescriptorLoader {
    OnnxOpDescriptorLoader::new(
        vec![
            onnx_schema("Add", &["A", "B"], &["C"]),
            onnx_schema("Relu", &["X"], &["Y"]),
        ],
        nd4j_op_list(),
    )
}

/// A frozen registry with the TensorFlow loader.
pub fn tf_registry() -> Arc<OpDescriptorRegistry> {
    let registry = OpDescriptorRegistry::new();
    registry.register_loader(tf_loader()).unwrap();
    registry.freeze();
    Arc::new(registry)
}

/// A frozen registry with both loaders.
pub fn full_registry() -> Arc<OpDescriptorRegistry> {
    let registry = OpDescriptorRegistry::new();
    registry
        .bootstrap(vec![
            Box::new(tf_loader()) as Box<dyn framework_import::opdefs::OpDescriptorLoader>,
            Box::new(onnx_loader()),
        ])
        .unwrap();
    Arc::new(registry)
}

pub fn tf_shape(dims: &[i64]) -> Option<TensorShapeProto> {
    Some(TensorShapeProto {
        dim: dims
            .iter()
            .map(|size| Dim {
                size: *size,
                ..Default::default()
            })
            .collect(),
        unknown_rank: false,
    })
}

pub fn tf_float_tensor(dims: &[i64], values: &[f32]) -> TensorProto {
    TensorProto {
        dtype: DataType::DtFloat as i32,
        tensor_shape: tf_shape(dims),
        float_val: values.to_vec(),
        ..Default::default()
    }
}

pub fn onnx_float_tensor(name: &str, dims: &[i64], values: &[f32]) -> onnx_format::TensorProto {
    onnx_format::TensorProto {
        dims: dims.to_vec(),
        data_type: Some(1),
        float_data: values.to_vec(),
        name: Some(String::from(name)),
        ..Default::default()
    }
}
