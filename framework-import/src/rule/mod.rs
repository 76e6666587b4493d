//! # Mapping rules
//!
//! A rule translates part of a source node (its tensors or its attributes) into canonical
//! argument descriptors. Rules are created per node by a [`MappingProcess`], bound to it once,
//! then queried.
//!
//! Every rule shares the same state machine, kept in [`RuleState`]:
//! `Unbound -> Bound` via [`MappingRule::bind`], with no way back.
mod attribute;
mod context;
mod tensor;

pub use attribute::*;
pub use context::*;
pub use tensor::*;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::debug;
use strum::Display;

use crate::{
    error::{ImportError, NotFoundKind, Result},
    framework::Framework,
    ir::{ArgDescriptor, ArgType, TensorProto},
    opdefs::CanonicalCatalog,
    process::MappingProcess,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RuleCategory {
    #[strum(serialize = "tensor")]
    Tensor,
    #[strum(serialize = "attribute")]
    Attribute,
}

/// Ordered pairs of source argument name -> target argument name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable(Vec<(String, String)>);

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.0.push((source.into(), target.into()));
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.pairs().any(|(_, t)| t == target)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source names and target names must both be unique.
    pub fn validate(&self) -> Result<()> {
        let mut sources = HashSet::new();
        let mut targets = HashSet::new();
        for (source, target) in self.pairs() {
            if !sources.insert(source) {
                return Err(ImportError::Configuration(format!(
                    "source name {} is mapped twice",
                    source
                )));
            }
            if !targets.insert(target) {
                return Err(ImportError::Configuration(format!(
                    "target name {} is mapped twice",
                    target
                )));
            }
        }
        Ok(())
    }
}

impl<S, T> FromIterator<(S, T)> for MappingTable
where
    S: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
        )
    }
}

impl<S, T, const N: usize> From<[(S, T); N]> for MappingTable
where
    S: Into<String>,
    T: Into<String>,
{
    fn from(pairs: [(S, T); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<S, T> From<Vec<(S, T)>> for MappingTable
where
    S: Into<String>,
    T: Into<String>,
{
    fn from(pairs: Vec<(S, T)>) -> Self {
        pairs.into_iter().collect()
    }
}

/// State shared by every rule: its identity, its mapping table, the synthesized
/// arguments and the process it is bound to.
#[derive(Clone)]
pub struct RuleState {
    name: &'static str,
    category: RuleCategory,
    framework: &'static str,
    mapping: MappingTable,
    transformer_args: HashMap<String, Vec<ArgDescriptor>>,
    process: Option<MappingProcess>,
}

impl RuleState {
    pub fn new(
        name: &'static str,
        category: RuleCategory,
        framework: &'static str,
        mapping: MappingTable,
    ) -> Self {
        Self {
            name,
            category,
            framework,
            mapping,
            transformer_args: HashMap::new(),
            process: None,
        }
    }

    pub fn set_transformer_args(&mut self, transformer_args: HashMap<String, Vec<ArgDescriptor>>) {
        self.transformer_args = transformer_args;
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn category(&self) -> RuleCategory {
        self.category
    }

    pub fn framework(&self) -> &'static str {
        self.framework
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    pub fn transformer_args(&self) -> &HashMap<String, Vec<ArgDescriptor>> {
        &self.transformer_args
    }

    pub fn bind(&mut self, process: MappingProcess) -> Result<()> {
        if let Some(bound) = &self.process {
            return Err(ImportError::Configuration(format!(
                "rule {} is already bound to {} -> {}",
                self.name,
                bound.input_framework_op_name(),
                bound.op_name()
            )));
        }
        if process.input_framework() != self.framework {
            return Err(ImportError::Configuration(format!(
                "rule {} maps {} ops but the process imports from {}",
                self.name,
                self.framework,
                process.input_framework()
            )));
        }
        self.mapping.validate()?;

        debug!(
            "Bound {} rule {} to {} -> {}",
            self.framework,
            self.name,
            process.input_framework_op_name(),
            process.op_name()
        );
        self.process = Some(process);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.process.is_some()
    }

    pub fn process(&self) -> Result<&MappingProcess> {
        self.process.as_ref().ok_or_else(|| ImportError::UnboundRule {
            rule: String::from(self.name),
        })
    }

    pub fn canonical_catalog(&self) -> Result<Arc<CanonicalCatalog>> {
        Ok(self.process()?.registry().canonical_catalog())
    }

    /// Whether `name` is a declared input of the source op, per the framework's own catalog.
    pub fn is_input_tensor_name(&self, name: &str) -> Result<bool> {
        let process = self.process()?;
        let catalog = process.registry().catalog_for(process.input_framework())?;
        let op = catalog.find_op(process.input_framework_op_name())?;

        Ok(op.input_arg_names().contains(&name))
    }

    /// Whether `name` is an input tensor argument of the canonical op.
    ///
    /// Output names are checked against the canonical op's *input* tensors: the consumers
    /// of a mapped op address its canonical inputs by these names.
    pub fn is_output_tensor_name(&self, name: &str) -> Result<bool> {
        let process = self.process()?;
        let canonical = process.registry().canonical_catalog();
        let op = canonical.find_op(process.op_name())?;

        Ok(op.arg_names_of_kind(ArgType::InputTensor).contains(&name))
    }

    /// Walks the mapping table in order. Targets with transformer arguments get those
    /// descriptors, the others are copied by `copy`. Transformer arguments for targets
    /// absent from the table are appended last, sorted by target name.
    pub fn map_each<C>(&self, mut copy: C) -> Result<Vec<ArgDescriptor>>
    where
        C: FnMut(&str, &str, &mut Vec<ArgDescriptor>) -> Result<()>,
    {
        let mut args = Vec::new();
        for (source, target) in self.mapping.pairs() {
            match self.transformer_args.get(target) {
                Some(synthesized) => args.extend(synthesized.iter().cloned()),
                None => copy(source, target, &mut args)?,
            }
        }

        let mut extra = self
            .transformer_args
            .iter()
            .filter(|(target, _)| !self.mapping.has_target(target))
            .collect::<Vec<_>>();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        extra
            .into_iter()
            .for_each(|(_, synthesized)| args.extend(synthesized.iter().cloned()));

        Ok(args)
    }
}

/// Looks up the canonical argument `target` of `op_name` accepted by `accept`.
pub(crate) fn canonical_arg(
    catalog: &CanonicalCatalog,
    op_name: &str,
    target: &str,
    accept: impl Fn(ArgType) -> bool,
) -> Result<ArgDescriptor> {
    let op = catalog.find_op(op_name)?;
    op.find_arg(target, accept)
        .cloned()
        .ok_or_else(|| ImportError::not_found(NotFoundKind::Argument, format!("{}.{}", op_name, target)))
}

/// The contract every mapping rule implements.
///
/// Implementors only provide access to their [`RuleState`] and the conversion itself;
/// binding and name classification are shared.
pub trait MappingRule<F: Framework>: Send + Sync {
    fn state(&self) -> &RuleState;

    fn state_mut(&mut self) -> &mut RuleState;

    /// Produces the canonical arguments for the node described by `context`.
    fn convert(&self, context: &MappingContext<F::Tensor>) -> Result<Vec<ArgDescriptor>>;

    fn name(&self) -> &str {
        self.state().name()
    }

    fn category(&self) -> RuleCategory {
        self.state().category()
    }

    fn bind(&mut self, process: MappingProcess) -> Result<()> {
        self.state_mut().bind(process)
    }

    fn mapping_process(&self) -> Result<&MappingProcess> {
        self.state().process()
    }

    fn mapping_names_to_perform(&self) -> &MappingTable {
        self.state().mapping()
    }

    fn transformer_args(&self) -> &HashMap<String, Vec<ArgDescriptor>> {
        self.state().transformer_args()
    }

    fn is_input_tensor_name(&self, name: &str) -> Result<bool> {
        self.state().is_input_tensor_name(name)
    }

    fn is_output_tensor_name(&self, name: &str) -> Result<bool> {
        self.state().is_output_tensor_name(name)
    }

    fn convert_tensor(&self, tensor: &F::Tensor) -> Result<TensorProto> {
        F::convert_tensor(tensor)
    }
}
