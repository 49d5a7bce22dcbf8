//! Error types for encoding, decoding and storing trees

use ordtree_prototype::PrototypeError;
use ordtree_schema::SchemaError;
use ordtree_tree::{NodeId, TreeError};
use std::path::PathBuf;
use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Prototype error: {0}")]
    Prototype(#[from] PrototypeError),

    #[error("Corrupt binary value on node {node}: {reason}")]
    CorruptBinaryLeaf { node: NodeId, reason: String },

    #[error("Node {node} is stored as {stored} but its MTT node is {expected}")]
    ClassMismatch {
        node: NodeId,
        stored: String,
        expected: String,
    },

    #[error("Expected a {expected} graph, found {found}")]
    WrongTreeKind { expected: String, found: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Invalid document id: '{0}'")]
    InvalidDocumentId(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodecError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Decode a leaf value, reporting bad base64 against the node it sits on
pub(crate) fn leaf_error(node: NodeId, err: SchemaError) -> CodecError {
    match err {
        SchemaError::CorruptBinary(reason) => CodecError::CorruptBinaryLeaf { node, reason },
        other => CodecError::Schema(other),
    }
}
