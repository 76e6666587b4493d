use std::collections::HashMap;

use log::debug;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::{
    error::{ImportError, Result},
    ir::{self, element_count, to_le_buffer},
    onnx_format::{attribute_proto::AttributeType, AttributeProto, GraphProto, NodeProto, TensorProto},
    opdefs::FrameworkOpDef,
    rule::{AttributeValue, MappingContext},
};

use super::Framework;

/// ONNX graphs (`GraphProto`) and tensors (`TensorProto`).
pub struct Onnx;

/// `TensorProto.data_type` tags this importer reads. Complex types are left out.
#[derive(Debug, Clone, Copy, FromPrimitive, ToPrimitive, PartialEq, Eq)]
pub enum TensorDataType {
    Float = 1,
    Uint8,
    Int8,
    Uint16,
    Int16,
    Int32,
    Int64,
    /// Read from `string_data`, or NUL separated in `raw_data`.
    String,
    Bool,
    /// Stored as `u16` bits in `int32_data`.
    Float16,
    Double,
    /// Read from `uint64_data`.
    Uint32,
    Uint64,
    /// Stored as `u16` bits in `int32_data`.
    Bfloat16 = 16,
}

impl From<TensorDataType> for ir::DataType {
    fn from(value: TensorDataType) -> Self {
        match value {
            TensorDataType::Float => ir::DataType::Float,
            TensorDataType::Uint8 => ir::DataType::Uint8,
            TensorDataType::Int8 => ir::DataType::Int8,
            TensorDataType::Uint16 => ir::DataType::Uint16,
            TensorDataType::Int16 => ir::DataType::Int16,
            TensorDataType::Int32 => ir::DataType::Int32,
            TensorDataType::Int64 => ir::DataType::Int64,
            TensorDataType::String => ir::DataType::String,
            TensorDataType::Bool => ir::DataType::Bool,
            TensorDataType::Float16 => ir::DataType::Float16,
            TensorDataType::Double => ir::DataType::Double,
            TensorDataType::Uint32 => ir::DataType::Uint32,
            TensorDataType::Uint64 => ir::DataType::Uint64,
            TensorDataType::Bfloat16 => ir::DataType::Bfloat16,
        }
    }
}

impl Framework for Onnx {
    const NAME: &'static str = "onnx";

    type Graph = GraphProto;
    type Node = NodeProto;
    type Tensor = TensorProto;

    fn convert_tensor(proto: &TensorProto) -> Result<ir::TensorProto> {
        let element_data_type: TensorDataType = FromPrimitive::from_i32(proto.data_type())
            .ok_or_else(|| {
                ImportError::MalformedTensor(format!(
                    "invalid tensor element data type {} for {}",
                    proto.data_type(),
                    proto.name()
                ))
            })?;
        let data_type = ir::DataType::from(element_data_type);
        let name = proto.name();
        let dims = proto.dims.clone();
        element_count(&dims)?;

        if let Some(raw_data) = &proto.raw_data {
            if data_type == ir::DataType::String {
                // NUL separated, with an optional trailing terminator
                let strings = match raw_data.strip_suffix(&[0]).unwrap_or(raw_data.as_slice()) {
                    [] => Vec::new(),
                    data => data.split(|x| *x == 0).map(<[u8]>::to_vec).collect(),
                };
                return ir::TensorProto::from_strings(name, dims, strings);
            }
            return ir::TensorProto::from_raw(name, dims, data_type, raw_data.clone());
        }

        let raw_data = match element_data_type {
            TensorDataType::Float => to_le_buffer(&proto.float_data),
            TensorDataType::Double => to_le_buffer(&proto.double_data),
            TensorDataType::Int64 => to_le_buffer(&proto.int64_data),
            TensorDataType::Int32 => to_le_buffer(&proto.int32_data),
            TensorDataType::Uint8 | TensorDataType::Bool => {
                proto.int32_data.iter().map(|x| *x as u8).collect()
            }
            TensorDataType::Int8 => proto.int32_data.iter().map(|x| *x as i8 as u8).collect(),
            TensorDataType::Uint16 | TensorDataType::Float16 | TensorDataType::Bfloat16 => {
                to_le_buffer(&proto.int32_data.iter().map(|x| *x as u16).collect::<Vec<_>>())
            }
            TensorDataType::Int16 => {
                to_le_buffer(&proto.int32_data.iter().map(|x| *x as i16).collect::<Vec<_>>())
            }
            TensorDataType::Uint32 => {
                to_le_buffer(&proto.uint64_data.iter().map(|x| *x as u32).collect::<Vec<_>>())
            }
            TensorDataType::Uint64 => to_le_buffer(&proto.uint64_data),
            TensorDataType::String => {
                return ir::TensorProto::from_strings(name, dims, proto.string_data.clone())
            }
        };

        ir::TensorProto::from_raw(name, dims, data_type, raw_data)
    }

    fn nodes(graph: &GraphProto) -> &[NodeProto] {
        &graph.node
    }

    fn node_name(node: &NodeProto) -> &str {
        node.name()
    }

    fn node_op(node: &NodeProto) -> &str {
        node.op_type()
    }

    fn node_inputs(node: &NodeProto) -> Vec<String> {
        // an empty name marks an omitted optional input
        node.input
            .iter()
            .filter(|input| !input.is_empty())
            .cloned()
            .collect()
    }

    fn node_outputs(node: &NodeProto) -> Vec<String> {
        node.output.clone()
    }

    fn graph_constants(graph: &GraphProto) -> HashMap<String, TensorProto> {
        graph
            .initializer
            .iter()
            .map(|tensor| (String::from(tensor.name()), tensor.clone()))
            .collect()
    }

    fn mapping_context(
        node: &NodeProto,
        op_def: &FrameworkOpDef,
        constants: &HashMap<String, TensorProto>,
    ) -> Result<MappingContext<TensorProto>> {
        let schema = op_def.as_onnx().ok_or_else(|| {
            ImportError::Configuration(format!("{} is not an ONNX op schema", op_def.name()))
        })?;
        let mut context = MappingContext::new(node.name());

        for (arg_name, input) in schema.input.iter().zip(&node.input) {
            if let Some(tensor) = constants.get(input) {
                context.insert_tensor(arg_name.clone(), tensor.clone());
            }
        }

        for attribute in &node.attribute {
            let name = attribute.name();
            if let Some(tensor) = &attribute.t {
                context.insert_tensor(name, tensor.clone());
                continue;
            }
            match attribute_value(attribute) {
                Some(value) => context.insert_attribute(name, value),
                None => debug!("Skipping attribute {} of {}", name, node.name()),
            }
        }

        Ok(context)
    }
}

fn attribute_value(attribute: &AttributeProto) -> Option<AttributeValue> {
    let attribute_type = match attribute.r#type {
        Some(_) => attribute.r#type(),
        None => infer_attribute_type(attribute),
    };

    let value = match attribute_type {
        AttributeType::Float => AttributeValue::Float(attribute.f? as f64),
        AttributeType::Int => AttributeValue::Int(attribute.i?),
        AttributeType::String => {
            AttributeValue::String(String::from_utf8_lossy(attribute.s.as_ref()?).into_owned())
        }
        AttributeType::Floats => {
            AttributeValue::Floats(attribute.floats.iter().map(|f| *f as f64).collect())
        }
        AttributeType::Ints => AttributeValue::Ints(attribute.ints.clone()),
        AttributeType::Strings => AttributeValue::Strings(
            attribute
                .strings
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect(),
        ),
        AttributeType::Undefined
        | AttributeType::Tensor
        | AttributeType::Graph
        | AttributeType::Tensors => return None,
    };
    Some(value)
}

/// Old exporters leave `type` unset, the populated field tells the type apart.
fn infer_attribute_type(attribute: &AttributeProto) -> AttributeType {
    if attribute.f.is_some() {
        AttributeType::Float
    } else if attribute.i.is_some() {
        AttributeType::Int
    } else if attribute.s.is_some() {
        AttributeType::String
    } else if !attribute.floats.is_empty() {
        AttributeType::Floats
    } else if !attribute.ints.is_empty() {
        AttributeType::Ints
    } else if !attribute.strings.is_empty() {
        AttributeType::Strings
    } else {
        AttributeType::Undefined
    }
}
