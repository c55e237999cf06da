use ertapi_common::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Missing field {field:?}{}", describe_child(.index))]
    MissingField { field: String, index: Option<usize> },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("No fields requested from collection {0:?}")]
    NoFieldsRequested(String),

    #[error("Malformed collection {collection:?}: {reason}")]
    MalformedCollection { collection: String, reason: String },

    #[error("Link field {field:?} must be a string URL, got {found}")]
    InvalidLink { field: String, found: String },

    #[error("Cannot convert {token:?} to a number (row {row}, column {column})")]
    DataConversion { token: String, row: usize, column: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn describe_child(index: &Option<usize>) -> String {
    index.map(|i| format!(" on child {i}")).unwrap_or_default()
}

impl NodeError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField { field: field.to_string(), index: None }
    }

    pub(crate) fn missing_on_child(field: &str, index: usize) -> Self {
        Self::MissingField { field: field.to_string(), index: Some(index) }
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
