use std::collections::HashMap;

use log::debug;

use crate::{
    error::{ImportError, Result},
    ir::{self, element_count, raw_size, to_le_buffer, LeBytes},
    opdefs::FrameworkOpDef,
    rule::{AttributeValue, MappingContext},
    tensorflow_format::{
        attr_value::{ListValue, Value},
        op_def::ArgDef,
        AttrValue, DataType, GraphDef, NodeDef, TensorProto, TensorShapeProto,
    },
};

use super::Framework;

/// TensorFlow graphs (`GraphDef`) and tensors (`TensorProto`).
pub struct Tensorflow;

impl Framework for Tensorflow {
    const NAME: &'static str = "tensorflow";

    type Graph = GraphDef;
    type Node = NodeDef;
    type Tensor = TensorProto;

    fn convert_tensor(tensor: &TensorProto) -> Result<ir::TensorProto> {
        let dtype = DataType::try_from(tensor.dtype).map_err(|_| {
            ImportError::MalformedTensor(format!("unknown TensorFlow dtype tag {}", tensor.dtype))
        })?;
        let data_type = canonical_data_type(dtype).ok_or_else(|| {
            ImportError::MalformedTensor(format!("{:?} tensors are not supported", dtype))
        })?;
        let dims = tensor_dims(tensor.tensor_shape.as_ref())?;
        let count = element_count(&dims)?;

        if !tensor.tensor_content.is_empty() {
            return ir::TensorProto::from_raw("", dims, data_type, tensor.tensor_content.clone());
        }
        // filling allocates the whole tensor
        raw_size(
            count,
            data_type
                .element_size()
                .unwrap_or(std::mem::size_of::<Vec<u8>>()),
        )?;

        let raw_data = match data_type {
            ir::DataType::Float => fill_buffer(&tensor.float_val, count)?,
            ir::DataType::Double => fill_buffer(&tensor.double_val, count)?,
            ir::DataType::Int32 => fill_buffer(&tensor.int_val, count)?,
            ir::DataType::Int16 => fill_buffer(&narrow::<i16>(&tensor.int_val, dtype)?, count)?,
            ir::DataType::Int8 => fill_buffer(&narrow::<i8>(&tensor.int_val, dtype)?, count)?,
            ir::DataType::Uint16 => fill_buffer(&narrow::<u16>(&tensor.int_val, dtype)?, count)?,
            ir::DataType::Uint8 => fill_buffer(&narrow::<u8>(&tensor.int_val, dtype)?, count)?,
            ir::DataType::Int64 => fill_buffer(&tensor.int64_val, count)?,
            ir::DataType::Uint32 => fill_buffer(&tensor.uint32_val, count)?,
            ir::DataType::Uint64 => fill_buffer(&tensor.uint64_val, count)?,
            ir::DataType::Bool => fill_buffer(&tensor.bool_val, count)?,
            ir::DataType::Float16 | ir::DataType::Bfloat16 => {
                fill_buffer(&narrow::<u16>(&tensor.half_val, dtype)?, count)?
            }
            ir::DataType::String => {
                let strings = fill_strings(&tensor.string_val, count)?;
                return ir::TensorProto::from_strings("", dims, strings);
            }
            ir::DataType::Undefined => {
                return Err(ImportError::MalformedTensor(String::from(
                    "tensor has no data type",
                )))
            }
        };

        ir::TensorProto::from_raw("", dims, data_type, raw_data)
    }

    fn nodes(graph: &GraphDef) -> &[NodeDef] {
        &graph.node
    }

    fn node_name(node: &NodeDef) -> &str {
        &node.name
    }

    fn node_op(node: &NodeDef) -> &str {
        &node.op
    }

    fn node_inputs(node: &NodeDef) -> Vec<String> {
        node.input
            .iter()
            .map(|input| producer_name(input).to_string())
            .collect()
    }

    fn node_outputs(node: &NodeDef) -> Vec<String> {
        vec![node.name.clone()]
    }

    fn graph_constants(graph: &GraphDef) -> HashMap<String, TensorProto> {
        graph
            .node
            .iter()
            .filter(|node| node.op == "Const")
            .filter_map(|node| match node.attr.get("value") {
                Some(AttrValue {
                    value: Some(Value::Tensor(tensor)),
                }) => Some((node.name.clone(), tensor.clone())),
                _ => None,
            })
            .collect()
    }

    fn mapping_context(
        node: &NodeDef,
        op_def: &FrameworkOpDef,
        constants: &HashMap<String, TensorProto>,
    ) -> Result<MappingContext<TensorProto>> {
        let op_def = op_def.as_tensorflow().ok_or_else(|| {
            ImportError::Configuration(format!(
                "{} is not a TensorFlow op definition",
                op_def.name()
            ))
        })?;
        let mut context = MappingContext::new(node.name.clone());

        let data_inputs = node
            .input
            .iter()
            .filter(|input| !input.starts_with('^'))
            .collect::<Vec<_>>();
        for (name, input) in bind_inputs(node, &op_def.input_arg, &data_inputs) {
            if let Some(tensor) = constants.get(producer_name(input)) {
                context.insert_tensor(name, tensor.clone());
            }
        }

        for (name, value) in &node.attr {
            match &value.value {
                Some(Value::Tensor(tensor)) => context.insert_tensor(name.clone(), tensor.clone()),
                Some(other) => match attribute_value(other) {
                    Some(attribute) => context.insert_attribute(name.clone(), attribute),
                    None => debug!("Skipping attribute {} of {}", name, node.name),
                },
                None => {}
            }
        }

        Ok(context)
    }
}

/// Canonical element type of a TensorFlow dtype, if there is one.
pub fn canonical_data_type(dtype: DataType) -> Option<ir::DataType> {
    let data_type = match dtype {
        DataType::DtFloat => ir::DataType::Float,
        DataType::DtDouble => ir::DataType::Double,
        DataType::DtInt32 => ir::DataType::Int32,
        DataType::DtUint8 => ir::DataType::Uint8,
        DataType::DtInt16 => ir::DataType::Int16,
        DataType::DtInt8 => ir::DataType::Int8,
        DataType::DtString => ir::DataType::String,
        DataType::DtInt64 => ir::DataType::Int64,
        DataType::DtBool => ir::DataType::Bool,
        DataType::DtBfloat16 => ir::DataType::Bfloat16,
        DataType::DtUint16 => ir::DataType::Uint16,
        DataType::DtHalf => ir::DataType::Float16,
        DataType::DtUint32 => ir::DataType::Uint32,
        DataType::DtUint64 => ir::DataType::Uint64,
        _ => return None,
    };
    Some(data_type)
}

/// Pairs each data input with the argument name it is bound to.
///
/// List arguments (`number_attr` or `type_list_attr`) take as many inputs as the node's attribute
/// says, their elements are named `arg:0`, `arg:1`, ... When the attribute is missing, the list
/// takes every input not claimed by the arguments after it.
fn bind_inputs<'a>(
    node: &NodeDef,
    args: &[ArgDef],
    inputs: &[&'a String],
) -> Vec<(String, &'a String)> {
    let mut bound = Vec::with_capacity(inputs.len());
    let mut next = 0;
    for (position, arg) in args.iter().enumerate() {
        let remaining = inputs.len().saturating_sub(next);
        if arg.number_attr.is_empty() && arg.type_list_attr.is_empty() {
            if let Some(input) = inputs.get(next) {
                bound.push((arg.name.clone(), *input));
            }
            next += 1;
            continue;
        }

        let len = list_len(node, arg)
            .unwrap_or_else(|| remaining.saturating_sub(args.len() - position - 1))
            .min(remaining);
        for (index, input) in inputs.iter().skip(next).take(len).enumerate() {
            bound.push((format!("{}:{}", arg.name, index), *input));
        }
        next += len;
    }
    bound
}

fn list_len(node: &NodeDef, arg: &ArgDef) -> Option<usize> {
    if !arg.number_attr.is_empty() {
        return match node.attr.get(&arg.number_attr)?.value.as_ref()? {
            Value::I(n) => usize::try_from(*n).ok(),
            _ => None,
        };
    }
    match node.attr.get(&arg.type_list_attr)?.value.as_ref()? {
        Value::List(list) => Some(list.r#type.len()),
        _ => None,
    }
}

/// `node:1` and `^node` both refer to values produced by `node`.
fn producer_name(input: &str) -> &str {
    let input = input.strip_prefix('^').unwrap_or(input);
    match input.rsplit_once(':') {
        Some((name, index)) if index.chars().all(|c| c.is_ascii_digit()) => name,
        _ => input,
    }
}

fn tensor_dims(shape: Option<&TensorShapeProto>) -> Result<Vec<i64>> {
    match shape {
        None => Ok(Vec::new()),
        Some(shape) if shape.unknown_rank => Err(ImportError::MalformedTensor(String::from(
            "tensor shape has an unknown rank",
        ))),
        Some(shape) => Ok(shape.dim.iter().map(|dim| dim.size).collect()),
    }
}

fn narrow<T: num_traits::NumCast>(values: &[i32], dtype: DataType) -> Result<Vec<T>> {
    values
        .iter()
        .map(|v| {
            num_traits::cast(*v).ok_or_else(|| {
                ImportError::MalformedTensor(format!("{} is out of range for {:?}", v, dtype))
            })
        })
        .collect()
}

/// TensorFlow stores repeated trailing values once: the last value fills the rest of the tensor.
fn fill_buffer<T: LeBytes + Default>(values: &[T], count: usize) -> Result<Vec<u8>> {
    if values.len() > count {
        return Err(ImportError::MalformedTensor(format!(
            "{} values for a tensor of {} elements",
            values.len(),
            count
        )));
    }
    let last = values.last().copied().unwrap_or_default();
    let mut filled = values.to_vec();
    filled.resize(count, last);
    Ok(to_le_buffer(&filled))
}

fn fill_strings(values: &[Vec<u8>], count: usize) -> Result<Vec<Vec<u8>>> {
    if values.len() > count {
        return Err(ImportError::MalformedTensor(format!(
            "{} strings for a tensor of {} elements",
            values.len(),
            count
        )));
    }
    let last = values.last().cloned().unwrap_or_default();
    let mut filled = values.to_vec();
    filled.resize(count, last);
    Ok(filled)
}

fn attribute_value(value: &Value) -> Option<AttributeValue> {
    let attribute = match value {
        Value::S(bytes) => AttributeValue::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::I(i) => AttributeValue::Int(*i),
        Value::F(f) => AttributeValue::Float(*f as f64),
        Value::B(b) => AttributeValue::Bool(*b),
        Value::Type(tag) => AttributeValue::DataType(
            DataType::try_from(*tag).ok().and_then(canonical_data_type)?,
        ),
        Value::Shape(shape) => {
            AttributeValue::Ints(shape.dim.iter().map(|dim| dim.size).collect())
        }
        Value::List(list) => list_value(list)?,
        Value::Tensor(_) | Value::Placeholder(_) => return None,
    };
    Some(attribute)
}

fn list_value(list: &ListValue) -> Option<AttributeValue> {
    let value = if !list.i.is_empty() {
        AttributeValue::Ints(list.i.clone())
    } else if !list.f.is_empty() {
        AttributeValue::Floats(list.f.iter().map(|f| *f as f64).collect())
    } else if !list.b.is_empty() {
        AttributeValue::Bools(list.b.clone())
    } else if !list.s.is_empty() {
        AttributeValue::Strings(
            list.s
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect(),
        )
    } else if list.r#type.is_empty() && list.shape.is_empty() && list.tensor.is_empty() {
        AttributeValue::Ints(Vec::new())
    } else {
        return None;
    };
    Some(value)
}
