//! # Message Type Tree
//!
//! The schema-level skeleton of a message type: one node per reachable field
//! path. List and map fields get a single sentinel child standing for every
//! element or value.
//!
//! ```text
//! <ROOT>                              Message  ord.Reaction
//! ├── identifiers                     ListOfLiteral
//! │   └── <ListIndex>                 Literal  string
//! ├── inputs                          MapOfMessage
//! │   └── <DictKey>                   Message  ord.Compound
//! │       ├── name                    Literal  string
//! │       └── amount                  Message  ord.Amount
//! └── yield                           OptionalLiteral float
//! ```
//!
//! Built once per root type and immutable afterwards; share it through
//! [`MttCache`].

use crate::error::{TreeError, TreeResult};
use crate::graph::{Arborescence, NodeId};
use crate::path::{self, DICT_KEY, LIST_INDEX, ROOT_PATH};
use ordtree_schema::{FieldKind, NodeClass, TypeRef, TypeRegistry};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MttNode {
    pub path: String,
    pub kind: FieldKind,
    pub type_ref: TypeRef,
    pub class: NodeClass,
    /// Field name or sentinel; `None` at the root
    pub relation: Option<String>,
    /// Oneof group of the field this node stands for
    pub oneof_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageTypeTree {
    root_type: String,
    tree: Arborescence<MttNode, String>,
    by_path: HashMap<String, NodeId>,
}

impl MessageTypeTree {
    pub fn build(registry: &TypeRegistry, message_type: &str) -> TreeResult<Self> {
        let descriptor = registry.message(message_type)?;
        let type_ref = TypeRef::named(descriptor.name.clone());
        let root = MttNode {
            path: ROOT_PATH.to_string(),
            kind: FieldKind::Message,
            class: registry.node_class_of(&type_ref)?,
            type_ref,
            relation: None,
            oneof_group: None,
        };

        let mut mtt = Self {
            root_type: descriptor.name.clone(),
            tree: Arborescence::with_root(root),
            by_path: HashMap::from([(ROOT_PATH.to_string(), 0)]),
        };
        let mut expanding = vec![descriptor.name.clone()];
        mtt.expand_message(registry, 0, message_type, &mut expanding)?;
        mtt.tree.validate()?;

        debug!("built MTT for {} with {} nodes", mtt.root_type, mtt.tree.len());
        Ok(mtt)
    }

    fn expand_message(
        &mut self,
        registry: &TypeRegistry,
        parent: NodeId,
        message_type: &str,
        expanding: &mut Vec<String>,
    ) -> TreeResult<()> {
        for field in registry.fields_of(message_type)? {
            let kind = registry.classify(&field.type_ref)?;
            let child = self.add_node(
                registry,
                parent,
                &field.name,
                kind,
                field.type_ref.clone(),
                field.oneof.clone(),
            )?;
            self.expand_kind(registry, child, kind, &field.type_ref, expanding)?;
        }
        Ok(())
    }

    fn expand_kind(
        &mut self,
        registry: &TypeRegistry,
        node: NodeId,
        kind: FieldKind,
        type_ref: &TypeRef,
        expanding: &mut Vec<String>,
    ) -> TreeResult<()> {
        match kind {
            FieldKind::Literal | FieldKind::Enum | FieldKind::OptionalLiteral => Ok(()),
            FieldKind::Message => {
                let TypeRef::Named(name) = type_ref else {
                    return Err(TreeError::malformed(format!("message field typed {}", type_ref)));
                };
                if expanding.contains(name) {
                    return Err(TreeError::malformed(format!(
                        "schema cycle: {} -> {}",
                        expanding.join(" -> "),
                        name
                    )));
                }
                expanding.push(name.clone());
                self.expand_message(registry, node, name, expanding)?;
                expanding.pop();
                Ok(())
            }
            FieldKind::ListOfLiteral | FieldKind::ListOfMessage | FieldKind::MapOfLiteral | FieldKind::MapOfMessage => {
                let element = TypeRegistry::element_type_of(type_ref)
                    .ok_or_else(|| TreeError::malformed(format!("container field typed {}", type_ref)))?;
                let sentinel = if kind.is_list() { LIST_INDEX } else { DICT_KEY };
                let element_kind = registry.classify(element)?;
                let child = self.add_node(registry, node, sentinel, element_kind, element.clone(), None)?;
                self.expand_kind(registry, child, element_kind, element, expanding)
            }
        }
    }

    fn add_node(
        &mut self,
        registry: &TypeRegistry,
        parent: NodeId,
        relation: &str,
        kind: FieldKind,
        type_ref: TypeRef,
        oneof_group: Option<String>,
    ) -> TreeResult<NodeId> {
        let path = path::join(&self.tree.node(parent)?.path, relation);
        let node = MttNode {
            path: path.clone(),
            kind,
            class: registry.node_class_of(&type_ref)?,
            type_ref,
            relation: Some(relation.to_string()),
            oneof_group,
        };
        let id = self.tree.add_child(parent, relation.to_string(), node)?;
        if self.by_path.insert(path.clone(), id).is_some() {
            return Err(TreeError::malformed(format!("duplicate MTT path {}", path)));
        }
        Ok(id)
    }

    /// Reassemble from a decoded graph, re-checking the path index
    pub fn from_graph(root_type: impl Into<String>, tree: Arborescence<MttNode, String>) -> TreeResult<Self> {
        tree.validate()?;
        let mut by_path = HashMap::new();
        for (id, node) in tree.iter() {
            if by_path.insert(node.path.clone(), id).is_some() {
                return Err(TreeError::malformed(format!("duplicate MTT path {}", node.path)));
            }
        }
        let root = tree.root_id()?;
        if tree.node(root)?.path != ROOT_PATH {
            return Err(TreeError::malformed("MTT root is not at the root path"));
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

    pub fn graph(&self) -> &Arborescence<MttNode, String> {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn get(&self, path: &str) -> TreeResult<&MttNode> {
        let id = self
            .by_path
            .get(path)
            .ok_or_else(|| TreeError::PathNotFound(path.to_string()))?;
        self.tree.node(*id)
    }

    pub fn root(&self) -> TreeResult<&MttNode> {
        self.get(ROOT_PATH)
    }

    pub fn get_node_class(&self, path: &str) -> TreeResult<&NodeClass> {
        Ok(&self.get(path)?.class)
    }

    pub fn get_root_class(&self) -> TreeResult<&NodeClass> {
        self.get_node_class(ROOT_PATH)
    }

    pub fn kind_of(&self, path: &str) -> TreeResult<FieldKind> {
        Ok(self.get(path)?.kind)
    }

    /// Children in schema declaration order
    pub fn children(&self, path: &str) -> TreeResult<Vec<&MttNode>> {
        let id = self
            .by_path
            .get(path)
            .ok_or_else(|| TreeError::PathNotFound(path.to_string()))?;
        self.tree
            .children(*id)
            .iter()
            .map(|child| self.tree.node(*child))
            .collect()
    }

    /// Child reached through `relation` (a field name or sentinel)
    pub fn child(&self, path: &str, relation: &str) -> TreeResult<&MttNode> {
        self.get(&path::join(path, relation))
    }

    /// All nodes, depth first from the root
    pub fn nodes(&self) -> impl Iterator<Item = &MttNode> {
        self.tree
            .root()
            .map(|root| self.tree.preorder(root))
            .unwrap_or_default()
            .into_iter()
            .filter_map(move |id| self.tree.node(id).ok())
    }
}

/// Builds each type's MTT once and hands out shared handles
#[derive(Debug, Default)]
pub struct MttCache {
    trees: HashMap<String, Arc<MessageTypeTree>>,
}

impl MttCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, registry: &TypeRegistry, message_type: &str) -> TreeResult<Arc<MessageTypeTree>> {
        if let Some(mtt) = self.trees.get(message_type) {
            return Ok(Arc::clone(mtt));
        }
        let mtt = Arc::new(MessageTypeTree::build(registry, message_type)?);
        self.trees.insert(message_type.to_string(), Arc::clone(&mtt));
        Ok(mtt)
    }

    pub fn get(&self, message_type: &str) -> Option<Arc<MessageTypeTree>> {
        self.trees.get(message_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_schema::fixtures::{self, REACTION, TAGGED};
    use ordtree_schema::{LiteralType, MessageDescriptor};

    #[test]
    fn test_build_reaction_mtt() {
        let registry = fixtures::registry();
        let mtt = MessageTypeTree::build(&registry, REACTION).unwrap();

        assert_eq!(mtt.get_root_class().unwrap(), &NodeClass::Message(REACTION.into()));
        let workup_type = mtt.get("<ROOT>|workups|<ListIndex>|type").unwrap();
        assert_eq!(workup_type.kind, FieldKind::Enum);
        let value = mtt.get("<ROOT>|inputs|<DictKey>|amount|value").unwrap();
        assert_eq!(value.class, NodeClass::Literal(LiteralType::Float));
        assert_eq!(mtt.kind_of("<ROOT>|yield").unwrap(), FieldKind::OptionalLiteral);
        assert!(!mtt.contains("<ROOT>|_unknown_fields"));

        let top: Vec<&str> = mtt
            .children(ROOT_PATH)
            .unwrap()
            .iter()
            .filter_map(|n| n.relation.as_deref())
            .collect();
        assert_eq!(
            top,
            vec!["identifiers", "inputs", "workups", "notes", "raw", "yield", "is_automated"]
        );
    }

    #[test]
    fn test_mtt_is_arborescence() {
        let registry = fixtures::registry();
        for name in registry.message_names() {
            let mtt = MessageTypeTree::build(&registry, name).unwrap();
            let graph = mtt.graph();
            let roots = graph.node_ids().filter(|id| graph.parent(*id).is_none()).count();
            assert_eq!(roots, 1, "{}", name);
            assert_eq!(graph.links().count(), graph.len() - 1, "{}", name);
        }
    }

    #[test]
    fn test_oneof_group_recorded() {
        let registry = fixtures::registry();
        let mtt = MessageTypeTree::build(&registry, TAGGED).unwrap();
        assert_eq!(mtt.get("<ROOT>|a").unwrap().oneof_group.as_deref(), Some("kind"));
        assert_eq!(mtt.get("<ROOT>|name").unwrap().oneof_group, None);
        assert!(matches!(mtt.get("<ROOT>|nope"), Err(TreeError::PathNotFound(_))));
    }

    #[test]
    fn test_schema_cycle_is_malformed() {
        let mut registry = TypeRegistry::new();
        registry
            .register_message(MessageDescriptor::new("t.Node").field("next", TypeRef::named("t.Node")))
            .unwrap();
        let err = MessageTypeTree::build(&registry, "t.Node").unwrap_err();
        assert!(matches!(err, TreeError::MalformedTree(_)));
    }

    #[test]
    fn test_cache_shares_trees() {
        let registry = fixtures::registry();
        let mut cache = MttCache::new();
        let first = cache.get_or_build(&registry, REACTION).unwrap();
        let second = cache.get_or_build(&registry, REACTION).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
