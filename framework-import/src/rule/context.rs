use std::collections::HashMap;

use strum::IntoStaticStr;

use crate::{
    error::{ImportError, NotFoundKind, Result},
    ir::DataType,
};

/// A node attribute, independent of the framework it was read from.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    DataType(DataType),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Bools(Vec<bool>),
    Strings(Vec<String>),
}

impl AttributeValue {
    pub fn type_name(&self) -> &'static str {
        self.into()
    }
}

/// Everything a rule may read about the node being mapped: the constant tensors bound to the
/// op's declared argument names and the node attributes.
#[derive(Debug, Clone)]
pub struct MappingContext<T> {
    node_name: String,
    tensors: HashMap<String, T>,
    attributes: HashMap<String, AttributeValue>,
}

impl<T> MappingContext<T> {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            tensors: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_tensor(mut self, name: impl Into<String>, tensor: T) -> Self {
        self.insert_tensor(name, tensor);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.insert_attribute(name, value);
        self
    }

    pub fn insert_tensor(&mut self, name: impl Into<String>, tensor: T) {
        self.tensors.insert(name.into(), tensor);
    }

    pub fn insert_attribute(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(name.into(), value);
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn tensor(&self, name: &str) -> Result<&T> {
        self.tensors
            .get(name)
            .ok_or_else(|| ImportError::not_found(NotFoundKind::Tensor, self.qualified(name)))
    }

    pub fn attribute(&self, name: &str) -> Result<&AttributeValue> {
        self.attributes
            .get(name)
            .ok_or_else(|| ImportError::not_found(NotFoundKind::Attribute, self.qualified(name)))
    }

    pub fn has_tensor(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}/{}", self.node_name, name)
    }
}
