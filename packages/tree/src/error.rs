use crate::graph::NodeId;
use ordtree_schema::SchemaError;
use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("List indices under '{path}' are not contiguous: {indices:?}")]
    SequenceNotContiguous { path: String, indices: Vec<usize> },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Leaf '{0}' has no value")]
    MissingLeafValue(String),

    #[error("Value at '{path}' does not fit {expected}: found {found}")]
    ValueShapeMismatch {
        path: String,
        expected: String,
        found: String,
    },
}

impl TreeError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedTree(message.into())
    }

    pub fn shape(path: impl Into<String>, expected: impl ToString, found: impl Into<String>) -> Self {
        Self::ValueShapeMismatch {
            path: path.into(),
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}
