use strum::Display;
use thiserror::Error;

/// What kind of key a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NotFoundKind {
    #[strum(serialize = "framework")]
    Framework,
    #[strum(serialize = "op")]
    Op,
    #[strum(serialize = "canonical op")]
    CanonicalOp,
    #[strum(serialize = "argument")]
    Argument,
    #[strum(serialize = "tensor")]
    Tensor,
    #[strum(serialize = "attribute")]
    Attribute,
    #[strum(serialize = "op mapping")]
    Mapping,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Rule {rule} was queried before being bound to a mapping process")]
    UnboundRule { rule: String },

    #[error("No {kind} named {key} was found")]
    NotFound { kind: NotFoundKind, key: String },

    #[error("Malformed tensor: {0}")]
    MalformedTensor(String),

    #[error("Attribute {attribute} can't be mapped: expected {expected}, found {actual}")]
    AttributeTypeMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    #[error("The graph contains a cycle through node {node}")]
    GraphCycle { node: String },

    #[error("Unable to map node {node} of type {op}: {source}")]
    NodeMapping {
        node: String,
        op: String,
        #[source]
        source: Box<ImportError>,
    },

    #[error("Unable to read descriptor file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to decode descriptor file: {0}")]
    Decode(#[from] prost::DecodeError),
}

impl ImportError {
    pub fn not_found(kind: NotFoundKind, key: impl Into<String>) -> Self {
        ImportError::NotFound {
            kind,
            key: key.into(),
        }
    }
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
