//! Prototype nodes and edges and the states they can be in

use ordtree_schema::Literal;
use ordtree_tree::{NodeId, Relation};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementState {
    /// Structural node (message, list, map); never editable
    NodeNonLiteral,
    /// Literal node awaiting a value
    NodePlaceholder,
    /// Literal node with a value
    NodePreset,
    /// Map-key edge awaiting a key
    EdgePlaceholder,
    /// Map-key edge with a key, or a list-index edge
    EdgePreset,
    /// Named field edge; never editable
    EdgeAttrName,
}

impl ElementState {
    pub fn is_node_state(&self) -> bool {
        matches!(
            self,
            ElementState::NodeNonLiteral | ElementState::NodePlaceholder | ElementState::NodePreset
        )
    }

    pub fn is_edge_state(&self) -> bool {
        !self.is_node_state()
    }

    /// States that can never be changed into or out of
    pub fn is_fixed(&self) -> bool {
        matches!(self, ElementState::NodeNonLiteral | ElementState::EdgeAttrName)
    }
}

/// A node, or the edge `parent -> child`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementId {
    Node(NodeId),
    Edge(NodeId, NodeId),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Node(id) => write!(f, "node {}", id),
            ElementId::Edge(parent, child) => write!(f, "edge {} -> {}", parent, child),
        }
    }
}

/// What can be written into an editable element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementValue {
    /// Value of a literal node
    Literal(Literal),
    /// Key of a map edge
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeNode {
    pub state: ElementState,
    pub value: Option<Literal>,
    /// Type-level path of the MTT node this node maps to
    pub mtt_path: String,
}

impl PrototypeNode {
    pub fn non_literal(mtt_path: impl Into<String>) -> Self {
        Self {
            state: ElementState::NodeNonLiteral,
            value: None,
            mtt_path: mtt_path.into(),
        }
    }

    pub fn placeholder(mtt_path: impl Into<String>) -> Self {
        Self {
            state: ElementState::NodePlaceholder,
            value: None,
            mtt_path: mtt_path.into(),
        }
    }

    pub fn preset(mtt_path: impl Into<String>, value: Literal) -> Self {
        Self {
            state: ElementState::NodePreset,
            value: Some(value),
            mtt_path: mtt_path.into(),
        }
    }
}

/// Edge into a node. `relation` is the field name, the list index or the map
/// key; only a placeholder map edge may lack one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeEdge {
    pub state: ElementState,
    pub relation: Option<Relation>,
}

impl PrototypeEdge {
    pub fn attr_name(name: impl Into<String>) -> Self {
        Self {
            state: ElementState::EdgeAttrName,
            relation: Some(Relation::Field(name.into())),
        }
    }

    pub fn index(index: usize) -> Self {
        Self {
            state: ElementState::EdgePreset,
            relation: Some(Relation::Index(index)),
        }
    }

    pub fn key(state: ElementState, key: Option<String>) -> Self {
        Self {
            state,
            relation: key.map(Relation::Key),
        }
    }

    pub fn is_list_index(&self) -> bool {
        matches!(self.relation, Some(Relation::Index(_)))
    }
}
