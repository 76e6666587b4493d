use std::{collections::HashMap, marker::PhantomData};

use crate::{
    error::{ImportError, Result},
    framework::Framework,
    ir::{arg_descriptor::Value, ArgDescriptor, ArgType},
};

use super::{
    canonical_arg, AttributeValue, MappingContext, MappingRule, MappingTable, RuleCategory,
    RuleState,
};

/// Copies scalar attributes of the source node into non-tensor arguments of the canonical op.
pub struct ValueMappingRule<F> {
    state: RuleState,
    _framework: PhantomData<fn() -> F>,
}

impl<F: Framework> ValueMappingRule<F> {
    pub const NAME: &'static str = "valuemapping";

    pub fn new(mapping: impl Into<MappingTable>) -> Self {
        Self {
            state: RuleState::new(Self::NAME, RuleCategory::Attribute, F::NAME, mapping.into()),
            _framework: PhantomData,
        }
    }

    pub fn with_transformer_args(mut self, args: HashMap<String, Vec<ArgDescriptor>>) -> Self {
        self.state.set_transformer_args(args);
        self
    }
}

impl<F: Framework> MappingRule<F> for ValueMappingRule<F> {
    fn state(&self) -> &RuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RuleState {
        &mut self.state
    }

    fn convert(&self, context: &MappingContext<F::Tensor>) -> Result<Vec<ArgDescriptor>> {
        let process = self.state.process()?;
        let catalog = process.registry().canonical_catalog();

        self.state.map_each(|source, target, args| {
            let template = canonical_arg(&catalog, process.op_name(), target, |kind| {
                !kind.is_tensor()
            })?;
            let value = context.attribute(source)?;
            args.push(coerce_scalar(source, template, value)?);
            Ok(())
        })
    }
}

/// Expands list attributes into one canonical argument per element.
///
/// Elements take consecutive indices starting at the canonical argument's own index.
pub struct ListNumberToListNumber<F> {
    state: RuleState,
    _framework: PhantomData<fn() -> F>,
}

impl<F: Framework> ListNumberToListNumber<F> {
    pub const NAME: &'static str = "listnumbertolistnumber";

    pub fn new(mapping: impl Into<MappingTable>) -> Self {
        Self {
            state: RuleState::new(Self::NAME, RuleCategory::Attribute, F::NAME, mapping.into()),
            _framework: PhantomData,
        }
    }

    pub fn with_transformer_args(mut self, args: HashMap<String, Vec<ArgDescriptor>>) -> Self {
        self.state.set_transformer_args(args);
        self
    }
}

impl<F: Framework> MappingRule<F> for ListNumberToListNumber<F> {
    fn state(&self) -> &RuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RuleState {
        &mut self.state
    }

    fn convert(&self, context: &MappingContext<F::Tensor>) -> Result<Vec<ArgDescriptor>> {
        let process = self.state.process()?;
        let catalog = process.registry().canonical_catalog();

        self.state.map_each(|source, target, args| {
            let template = canonical_arg(&catalog, process.op_name(), target, |kind| {
                !kind.is_tensor()
            })?;
            let value = context.attribute(source)?;
            let (arg_type, values) = coerce_list(source, &template, value)?;

            args.extend(values.into_iter().enumerate().map(|(offset, value)| {
                ArgDescriptor::new(target, arg_type, template.arg_index + offset as i32)
                    .with_value(value)
            }));
            Ok(())
        })
    }
}

fn mismatch(attribute: &str, expected: ArgType, value: &AttributeValue) -> ImportError {
    ImportError::AttributeTypeMismatch {
        attribute: String::from(attribute),
        expected: format!("{:?}", expected),
        actual: String::from(value.type_name()),
    }
}

fn template_kind(template: &ArgDescriptor) -> Result<ArgType> {
    template.kind().ok_or_else(|| {
        ImportError::Configuration(format!(
            "argument {} has unknown type tag {}",
            template.name, template.arg_type
        ))
    })
}

fn coerce_scalar(
    attribute: &str,
    mut template: ArgDescriptor,
    value: &AttributeValue,
) -> Result<ArgDescriptor> {
    let kind = template_kind(&template)?;
    let coerced = match (kind, value) {
        (ArgType::Int64 | ArgType::Int32, AttributeValue::Int(i)) => Value::Int64Value(*i),
        (ArgType::Int64 | ArgType::Int32, AttributeValue::Bool(b)) => {
            template.convert_bool_to_int = true;
            Value::Int64Value(i64::from(*b))
        }
        (ArgType::Double | ArgType::Float, AttributeValue::Float(f)) => Value::DoubleValue(*f),
        (ArgType::Double | ArgType::Float, AttributeValue::Int(i)) => Value::DoubleValue(*i as f64),
        (ArgType::Bool, AttributeValue::Bool(b)) => Value::BoolValue(*b),
        (ArgType::Bool, AttributeValue::Int(i)) => Value::BoolValue(*i != 0),
        (ArgType::String, AttributeValue::String(s)) => Value::StringValue(s.clone()),
        (ArgType::DataType, AttributeValue::DataType(d)) => Value::DataTypeValue(*d as i32),
        _ => return Err(mismatch(attribute, kind, value)),
    };
    template.value = Some(coerced);
    Ok(template)
}

fn coerce_list(
    attribute: &str,
    template: &ArgDescriptor,
    value: &AttributeValue,
) -> Result<(ArgType, Vec<Value>)> {
    let kind = template_kind(template)?;
    let coerced = match (kind, value) {
        (ArgType::Int64 | ArgType::Int32, AttributeValue::Ints(values)) => (
            ArgType::Int64,
            values.iter().map(|i| Value::Int64Value(*i)).collect(),
        ),
        (ArgType::Double | ArgType::Float, AttributeValue::Floats(values)) => (
            ArgType::Double,
            values.iter().map(|f| Value::DoubleValue(*f)).collect(),
        ),
        (ArgType::Double | ArgType::Float, AttributeValue::Ints(values)) => (
            ArgType::Double,
            values.iter().map(|i| Value::DoubleValue(*i as f64)).collect(),
        ),
        _ => return Err(mismatch(attribute, kind, value)),
    };
    Ok(coerced)
}
