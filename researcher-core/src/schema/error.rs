use thiserror::Error;

/// Raised while turning a tool's input schema into a [`RecordDefinition`].
///
/// [`RecordDefinition`]: super::RecordDefinition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema for '{record}' is invalid: {reason}")]
    InvalidSchema { record: String, reason: String },

    #[error("array field '{field}' does not declare an item type")]
    MissingItemsType { field: String },

    #[error("field '{field}' has unsupported type '{kind}'")]
    UnsupportedKind { field: String, kind: String },

    #[error(
        "field '{field}' of type '{kind}' has neither nested properties nor a resolvable reference"
    )]
    UnsupportedObject { field: String, kind: String },

    #[error("field '{field}' references '{reference}' but no sibling property matches it")]
    UnresolvedReference { field: String, reference: String },
}

impl SchemaError {
    /// Name of the property the error was raised for.
    pub fn field(&self) -> &str {
        match self {
            SchemaError::InvalidSchema { record, .. } => record,
            SchemaError::MissingItemsType { field }
            | SchemaError::UnsupportedKind { field, .. }
            | SchemaError::UnsupportedObject { field, .. }
            | SchemaError::UnresolvedReference { field, .. } => field,
        }
    }
}

/// Raised when keyword arguments do not fit a [`RecordDefinition`].
///
/// `path` is dotted (`filters.tags[2]`) and rooted at the record itself.
///
/// [`RecordDefinition`]: super::RecordDefinition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("arguments for '{record}' must be an object, found {found}")]
    NotAnObject { record: String, found: &'static str },

    #[error("missing required field '{path}'")]
    MissingField { path: String },

    #[error("field '{path}' expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },
}
