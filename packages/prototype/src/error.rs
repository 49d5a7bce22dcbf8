//! Error types for prototype editing

use crate::element::{ElementId, ElementState};
use ordtree_schema::SchemaError;
use ordtree_tree::{NodeId, TreeError};
use thiserror::Error;

pub type PrototypeResult<T> = Result<T, PrototypeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrototypeError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Edge not found: {0} -> {1}")]
    EdgeNotFound(NodeId, NodeId),

    #[error("The root node cannot be removed")]
    CannotRemoveRoot,

    #[error("Union target {0} already has children")]
    UnionTargetNotEmpty(NodeId),

    #[error("Object tree of type {found} does not match a {expected} type tree")]
    RootTypeMismatch { expected: String, found: String },

    #[error("Cannot put a {other} tree in place of a {target} node")]
    IncompatibleUnion { target: String, other: String },

    #[error("Value for {element} must be {expected}, found {found}")]
    ValueTypeMismatch {
        element: ElementId,
        expected: String,
        found: String,
    },

    #[error("Key '{key}' is already used under node {parent}")]
    DuplicateMapKey { parent: NodeId, key: String },

    #[error("Map edge {parent} -> {child} has no key")]
    UnsetMapKey { parent: NodeId, child: NodeId },

    #[error("{state:?} is not a valid state for {element}")]
    InvalidState { element: ElementId, state: ElementState },

    #[error("{0} is not a placeholder")]
    NotPlaceholder(ElementId),

    #[error("Unknown prototype: {0}")]
    UnknownPrototype(String),

    #[error("Could not load prototype '{id}': {reason}")]
    SourceUnavailable { id: String, reason: String },
}
