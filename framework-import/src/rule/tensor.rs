use std::{collections::HashMap, marker::PhantomData};

use crate::{
    error::Result,
    framework::{Framework, Onnx, Tensorflow},
    ir::{ArgDescriptor, ArgType},
};

use super::{canonical_arg, MappingContext, MappingRule, MappingTable, RuleCategory, RuleState};

/// Copies tensors of the source node into input tensor arguments of the canonical op.
///
/// Each `(source, target)` pair of the mapping table reads the tensor bound to `source`
/// in the node context, converts it and emits it as the canonical input `target`,
/// at the index the canonical catalog declares for it.
pub struct NDArrayMappingRule<F> {
    state: RuleState,
    _framework: PhantomData<fn() -> F>,
}

pub type TensorflowNDArrayMappingRule = NDArrayMappingRule<Tensorflow>;
pub type OnnxNDArrayMappingRule = NDArrayMappingRule<Onnx>;

impl<F: Framework> NDArrayMappingRule<F> {
    pub const NAME: &'static str = "ndarraymapping";

    pub fn new(mapping: impl Into<MappingTable>) -> Self {
        Self {
            state: RuleState::new(Self::NAME, RuleCategory::Tensor, F::NAME, mapping.into()),
            _framework: PhantomData,
        }
    }

    pub fn with_transformer_args(mut self, args: HashMap<String, Vec<ArgDescriptor>>) -> Self {
        self.state.set_transformer_args(args);
        self
    }
}

impl<F: Framework> MappingRule<F> for NDArrayMappingRule<F> {
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
            let arg = canonical_arg(&catalog, process.op_name(), target, |kind| {
                kind == ArgType::InputTensor
            })?;
            let mut tensor = F::convert_tensor(context.tensor(source)?)?;
            if tensor.name.is_empty() {
                tensor.name = String::from(source);
            }
            args.push(ArgDescriptor::input_tensor(target, arg.arg_index, tensor));
            Ok(())
        })
    }
}
