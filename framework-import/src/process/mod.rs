//! # Mapping processes
//!
//! A [`MappingProcess`] ties one input-framework op to one canonical op. An [`OpMapping`]
//! adds the rules that perform the translation, and an [`OpMappingRegistry`] collects the
//! op mappings of a framework.
use std::{collections::HashMap, fmt, sync::Arc};

use log::debug;

use crate::{
    error::{ImportError, NotFoundKind, Result},
    framework::Framework,
    ir::OpDescriptor,
    opdefs::OpDescriptorRegistry,
    rule::{MappingContext, MappingRule},
};

#[derive(Clone)]
pub struct MappingProcess {
    input_framework: String,
    input_framework_op_name: String,
    op_name: String,
    registry: Arc<OpDescriptorRegistry>,
}

impl MappingProcess {
    pub fn new(
        registry: Arc<OpDescriptorRegistry>,
        input_framework: impl Into<String>,
        input_framework_op_name: impl Into<String>,
        op_name: impl Into<String>,
    ) -> Self {
        Self {
            input_framework: input_framework.into(),
            input_framework_op_name: input_framework_op_name.into(),
            op_name: op_name.into(),
            registry,
        }
    }

    pub fn input_framework(&self) -> &str {
        &self.input_framework
    }

    pub fn input_framework_op_name(&self) -> &str {
        &self.input_framework_op_name
    }

    /// Name of the canonical op the process produces.
    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    pub fn registry(&self) -> &Arc<OpDescriptorRegistry> {
        &self.registry
    }
}

impl fmt::Debug for MappingProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingProcess")
            .field("input_framework", &self.input_framework)
            .field("input_framework_op_name", &self.input_framework_op_name)
            .field("op_name", &self.op_name)
            .finish()
    }
}

type RuleFactory<F> = Box<dyn Fn() -> Box<dyn MappingRule<F>> + Send + Sync>;

/// How one input-framework op becomes one canonical op.
///
/// Rules hold per-node binding state, so the mapping keeps factories and builds
/// fresh rules for every node.
pub struct OpMapping<F: Framework> {
    input_framework_op_name: String,
    op_name: String,
    rules: Vec<RuleFactory<F>>,
}

impl<F: Framework> OpMapping<F> {
    pub fn new(input_framework_op_name: impl Into<String>, op_name: impl Into<String>) -> Self {
        Self {
            input_framework_op_name: input_framework_op_name.into(),
            op_name: op_name.into(),
            rules: Vec::new(),
        }
    }

    pub fn rule<R, C>(mut self, factory: C) -> Self
    where
        R: MappingRule<F> + 'static,
        C: Fn() -> R + Send + Sync + 'static,
    {
        self.rules
            .push(Box::new(move || Box::new(factory()) as Box<dyn MappingRule<F>>));
        self
    }

    pub fn input_framework_op_name(&self) -> &str {
        &self.input_framework_op_name
    }

    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    pub fn process(&self, registry: Arc<OpDescriptorRegistry>) -> MappingProcess {
        MappingProcess::new(
            registry,
            F::NAME,
            self.input_framework_op_name.clone(),
            self.op_name.clone(),
        )
    }

    /// Builds and binds every rule, then collects their arguments into a canonical op.
    pub fn map_node(
        &self,
        registry: &Arc<OpDescriptorRegistry>,
        context: &MappingContext<F::Tensor>,
    ) -> Result<OpDescriptor> {
        // fails early when the canonical op is unknown, even for rule-less mappings
        registry.canonical_catalog().find_op(&self.op_name)?;

        let process = self.process(Arc::clone(registry));
        let mut args = Vec::new();
        for factory in &self.rules {
            let mut rule = factory();
            rule.bind(process.clone())?;
            args.extend(rule.convert(context)?);
        }

        debug!(
            "Mapped {} ({}) to {} with {} arguments",
            context.node_name(),
            self.input_framework_op_name,
            self.op_name,
            args.len()
        );
        Ok(OpDescriptor::new(self.op_name.clone(), args))
    }
}

/// Input-framework op name -> op mapping, for a single framework.
pub struct OpMappingRegistry<F: Framework> {
    mappings: HashMap<String, OpMapping<F>>,
}

impl<F: Framework> Default for OpMappingRegistry<F> {
    fn default() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }
}

impl<F: Framework> OpMappingRegistry<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping, replacing any previous mapping of the same input-framework op.
    pub fn register(&mut self, mapping: OpMapping<F>) -> Option<OpMapping<F>> {
        self.mappings
            .insert(mapping.input_framework_op_name.clone(), mapping)
    }

    pub fn with(mut self, mapping: OpMapping<F>) -> Self {
        self.register(mapping);
        self
    }

    pub fn get(&self, input_framework_op_name: &str) -> Option<&OpMapping<F>> {
        self.mappings.get(input_framework_op_name)
    }

    pub fn find_mapping(&self, input_framework_op_name: &str) -> Result<&OpMapping<F>> {
        self.get(input_framework_op_name).ok_or_else(|| {
            ImportError::not_found(
                NotFoundKind::Mapping,
                format!("{}:{}", F::NAME, input_framework_op_name),
            )
        })
    }

    pub fn op_names(&self) -> Vec<&str> {
        let mut names = self.mappings.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
