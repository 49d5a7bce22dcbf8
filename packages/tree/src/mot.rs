//! # Message Object Tree
//!
//! One message instance as a tree of materialized values. Every node maps
//! back to an MTT node through its type-level path, and is also addressable by
//! its concrete path.
//!
//! Construction compacts the instance: fields holding nothing meaningful
//! produce no node. At a message node a field is skipped when it is
//!
//! - an unset optional literal or unset oneof member
//! - an empty string, list or map
//! - a sub-message whose every field is default
//!
//! Optional and oneof fields that are set carry presence and are always
//! kept. List elements and map values are never skipped: their positions and
//! keys are part of the data.

use crate::error::{TreeError, TreeResult};
use crate::graph::{Arborescence, NodeId};
use crate::mtt::{MessageTypeTree, MttNode};
use crate::path::{self, Relation, ROOT_PATH};
use ordtree_schema::{FieldKind, Literal, Message, NodeClass, TypeRegistry, Value};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotNode {
    /// Concrete path, unique within the tree
    pub path: String,
    /// Path of the MTT node this node maps to
    pub mtt_path: String,
    pub class: NodeClass,
    /// Present only on literal and enum leaves
    pub value: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageObjectTree {
    root_type: String,
    tree: Arborescence<MotNode, Relation>,
    by_path: HashMap<String, NodeId>,
}

impl MessageObjectTree {
    /// Build from a message, guided by the MTT of its type
    pub fn build(registry: &TypeRegistry, mtt: &MessageTypeTree, message: &Message) -> TreeResult<Self> {
        if message.type_name() != mtt.root_type() {
            return Err(TreeError::shape(ROOT_PATH, mtt.root_type(), message.type_name()));
        }
        let root = MotNode {
            path: ROOT_PATH.to_string(),
            mtt_path: ROOT_PATH.to_string(),
            class: mtt.get_root_class()?.clone(),
            value: None,
        };
        let mut mot = Self {
            root_type: mtt.root_type().to_string(),
            tree: Arborescence::with_root(root),
            by_path: HashMap::from([(ROOT_PATH.to_string(), 0)]),
        };
        mot.extend_message(registry, mtt, 0, message)?;

        debug!("built MOT for {} with {} nodes", mot.root_type, mot.tree.len());
        Ok(mot)
    }

    /// Build the MTT on the fly; prefer [`MessageObjectTree::build`] with a
    /// cached MTT when converting many messages.
    pub fn from_message(registry: &TypeRegistry, message: &Message) -> TreeResult<Self> {
        let mtt = MessageTypeTree::build(registry, message.type_name())?;
        Self::build(registry, &mtt, message)
    }

    fn extend_message(
        &mut self,
        registry: &TypeRegistry,
        mtt: &MessageTypeTree,
        node: NodeId,
        message: &Message,
    ) -> TreeResult<()> {
        let mtt_path = self.tree.node(node)?.mtt_path.clone();

        for field in mtt.children(&mtt_path)? {
            let Some(name) = field.relation.as_deref() else {
                continue;
            };
            let presence = field.kind == FieldKind::OptionalLiteral || field.oneof_group.is_some();

            let value = match message.get(name) {
                Some(value) => value.clone(),
                None if presence => continue,
                None => match registry.default_value(&field.type_ref)? {
                    Some(value) => value,
                    None => continue,
                },
            };
            if !presence && is_compacted(registry, &value, field.kind) {
                continue;
            }

            self.attach(registry, mtt, node, Relation::Field(name.to_string()), field, &value)?;
        }
        Ok(())
    }

    /// Add the node for `value` under `parent` and expand it
    fn attach(
        &mut self,
        registry: &TypeRegistry,
        mtt: &MessageTypeTree,
        parent: NodeId,
        relation: Relation,
        mtt_node: &MttNode,
        value: &Value,
    ) -> TreeResult<()> {
        let path = path::join(&self.tree.node(parent)?.path, &relation.segment());
        let shape_error = || TreeError::shape(&path, &mtt_node.type_ref, value.shape_name());

        let literal = match (mtt_node.kind, value) {
            (FieldKind::Literal | FieldKind::OptionalLiteral | FieldKind::Enum, Value::Literal(lit)) => {
                if !lit.fits(&mtt_node.class) {
                    return Err(shape_error());
                }
                Some(lit.clone())
            }
            (FieldKind::Message, Value::Message(m)) if mtt_node.class.message_name() == Some(m.type_name()) => None,
            (FieldKind::ListOfLiteral | FieldKind::ListOfMessage, Value::List(_)) => None,
            (FieldKind::MapOfLiteral | FieldKind::MapOfMessage, Value::Map(_)) => None,
            _ => return Err(shape_error()),
        };

        let node = MotNode {
            path: path.clone(),
            mtt_path: mtt_node.path.clone(),
            class: mtt_node.class.clone(),
            value: literal,
        };
        let id = self.tree.add_child(parent, relation, node)?;
        if self.by_path.insert(path.clone(), id).is_some() {
            return Err(TreeError::malformed(format!("duplicate MOT path {}", path)));
        }

        match value {
            Value::Message(m) => self.extend_message(registry, mtt, id, m),
            Value::List(items) => {
                let element = mtt.child(&mtt_node.path, path::LIST_INDEX)?;
                for (index, item) in items.iter().enumerate() {
                    self.attach(registry, mtt, id, Relation::Index(index), element, item)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                let element = mtt.child(&mtt_node.path, path::DICT_KEY)?;
                for (key, entry) in entries {
                    self.attach(registry, mtt, id, Relation::Key(key.clone()), element, entry)?;
                }
                Ok(())
            }
            Value::Literal(_) => Ok(()),
        }
    }

    /// Reassemble from a decoded or converted graph, re-checking paths
    pub fn from_graph(root_type: impl Into<String>, tree: Arborescence<MotNode, Relation>) -> TreeResult<Self> {
        tree.validate()?;
        let mut by_path = HashMap::new();
        for (id, node) in tree.iter() {
            if by_path.insert(node.path.clone(), id).is_some() {
                return Err(TreeError::malformed(format!("duplicate MOT path {}", node.path)));
            }
        }
        Ok(Self {
            root_type: root_type.into(),
            tree,
            by_path,
        })
    }

    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    pub fn graph(&self) -> &Arborescence<MotNode, Relation> {
        &self.tree
    }

    pub fn into_graph(self) -> Arborescence<MotNode, Relation> {
        self.tree
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&MotNode> {
        self.tree.node(id)
    }

    pub fn relation(&self, id: NodeId) -> Option<&Relation> {
        self.tree.edge(id)
    }

    pub fn path_of(&self, id: NodeId) -> TreeResult<&str> {
        Ok(&self.tree.node(id)?.path)
    }

    pub fn node_by_path(&self, path: &str) -> TreeResult<NodeId> {
        self.by_path
            .get(path)
            .copied()
            .ok_or_else(|| TreeError::PathNotFound(path.to_string()))
    }

    /// Materialized value at a concrete path, if that node is a leaf value
    pub fn value_at(&self, path: &str) -> TreeResult<Option<&Literal>> {
        Ok(self.tree.node(self.node_by_path(path)?)?.value.as_ref())
    }
}

/// Whether a non-presence field value is left out of the tree
fn is_compacted(registry: &TypeRegistry, value: &Value, kind: FieldKind) -> bool {
    match (kind, value) {
        (FieldKind::Literal, Value::Literal(Literal::String(s))) => s.is_empty(),
        (FieldKind::Message | FieldKind::ListOfLiteral | FieldKind::ListOfMessage, _)
        | (FieldKind::MapOfLiteral | FieldKind::MapOfMessage, _) => registry.is_default(value, kind),
        _ => false,
    }
}
