//! Folding a MOT back into a message.
//!
//! Works on a copy of the tree: repeatedly take the deepest leaf, fold all
//! children of its parent into one value, drop the children and store the
//! value on the parent, until only the root is left.

use crate::error::{TreeError, TreeResult};
use crate::graph::Arborescence;
use crate::mot::{MessageObjectTree, MotNode};
use crate::path::Relation;
use ordtree_schema::{Message, NodeClass, TypeRegistry, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Node of the working tree: the MOT node plus the value folded into it
#[derive(Debug, Clone)]
struct Folding {
    path: String,
    class: NodeClass,
    value: Option<Value>,
}

impl Folding {
    fn from_mot(node: &MotNode) -> Self {
        Self {
            path: node.path.clone(),
            class: node.class.clone(),
            value: node.value.clone().map(Value::Literal),
        }
    }

    /// Folded value; childless containers and messages are empty
    fn into_value(self) -> TreeResult<Value> {
        if let Some(value) = self.value {
            return Ok(value);
        }
        match self.class {
            NodeClass::Message(name) => Ok(Value::Message(Message::new(name))),
            NodeClass::List => Ok(Value::List(Vec::new())),
            NodeClass::Map => Ok(Value::Map(BTreeMap::new())),
            NodeClass::Literal(_) | NodeClass::Enum(_) => Err(TreeError::MissingLeafValue(self.path)),
        }
    }
}

impl MessageObjectTree {
    /// Reconstruct the value held by the root. The tree is left untouched.
    pub fn reduce(&self, registry: &TypeRegistry) -> TreeResult<Value> {
        let source = self.graph();
        let mut working: Arborescence<Folding, Relation> = Arborescence::from_parts(
            source.iter().map(|(id, node)| (id, Folding::from_mot(node))),
            source.links().map(|(parent, child, relation)| (parent, child, relation.clone())),
        )?;

        while working.len() > 1 {
            let leaf = working
                .deepest_leaf()
                .ok_or_else(|| TreeError::malformed("tree without leaves"))?;
            let parent = working
                .parent(leaf)
                .ok_or_else(|| TreeError::malformed(format!("leaf {} has no parent", leaf)))?;

            let before = working.len();
            let children = working.take_leaf_children(parent)?;
            let node = working.node_mut(parent)?;
            debug!("contracting {} children into {}", children.len(), node.path);

            let folded = fold(registry, node, children)?;
            node.value = Some(folded);
            debug!("tree size contraction: {} -> {}", before, working.len());
        }

        let root = working.root_id()?;
        working.node(root)?.clone().into_value()
    }

    /// [`MessageObjectTree::reduce`], expecting a message at the root
    pub fn reduce_message(&self, registry: &TypeRegistry) -> TreeResult<Message> {
        match self.reduce(registry)? {
            Value::Message(message) => Ok(message),
            other => Err(TreeError::shape(crate::path::ROOT_PATH, self.root_type(), other.shape_name())),
        }
    }
}

fn fold(registry: &TypeRegistry, parent: &Folding, children: Vec<(Relation, Folding)>) -> TreeResult<Value> {
    match &parent.class {
        NodeClass::Message(name) => {
            let mut message = Message::new(name.clone());
            for (relation, child) in children {
                let field = relation.field_name().ok_or_else(|| {
                    TreeError::malformed(format!("{} under message {} is not a field", relation, parent.path))
                })?;
                let field = field.to_string();
                registry.set_field(&mut message, &field, child.into_value()?)?;
            }
            Ok(Value::Message(message))
        }
        NodeClass::List => {
            let mut items = Vec::with_capacity(children.len());
            for (relation, child) in children {
                let index = relation.index().ok_or_else(|| {
                    TreeError::malformed(format!("{} under list {} is not an index", relation, parent.path))
                })?;
                items.push((index, child));
            }
            items.sort_by_key(|(index, _)| *index);
            let indices: Vec<usize> = items.iter().map(|(index, _)| *index).collect();
            if indices.iter().enumerate().any(|(position, index)| position != *index) {
                return Err(TreeError::SequenceNotContiguous {
                    path: parent.path.clone(),
                    indices,
                });
            }
            items
                .into_iter()
                .map(|(_, child)| child.into_value())
                .collect::<TreeResult<Vec<_>>>()
                .map(Value::List)
        }
        NodeClass::Map => {
            let mut entries = BTreeMap::new();
            for (relation, child) in children {
                let key = relation
                    .key()
                    .ok_or_else(|| TreeError::malformed(format!("{} under map {} is not a key", relation, parent.path)))?
                    .to_string();
                if entries.insert(key.clone(), child.into_value()?).is_some() {
                    return Err(TreeError::malformed(format!("duplicate key {} under {}", key, parent.path)));
                }
            }
            Ok(Value::Map(entries))
        }
        NodeClass::Enum(name) => Err(TreeError::malformed(format!(
            "enum {} at {} can only be a leaf",
            name, parent.path
        ))),
        NodeClass::Literal(lit) => Err(TreeError::malformed(format!(
            "literal {} at {} can only be a leaf",
            lit, parent.path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ROOT_PATH;
    use ordtree_schema::fixtures::{self, REACTION, WORKUP_TYPE};
    use ordtree_schema::{Literal, LiteralType};

    fn node(path: &str, mtt_path: &str, class: NodeClass, value: Option<Literal>) -> MotNode {
        MotNode {
            path: path.into(),
            mtt_path: mtt_path.into(),
            class,
            value,
        }
    }

    fn identifiers_tree(indices: &[usize]) -> MessageObjectTree {
        let mut nodes = vec![
            (0, node(ROOT_PATH, ROOT_PATH, NodeClass::Message(REACTION.into()), None)),
            (1, node("<ROOT>|identifiers", "<ROOT>|identifiers", NodeClass::List, None)),
        ];
        let mut links = vec![(0, 1, Relation::Field("identifiers".into()))];
        for (i, index) in indices.iter().enumerate() {
            let id = i + 2;
            nodes.push((
                id,
                node(
                    &format!("<ROOT>|identifiers|<ListIndex>{}", index),
                    "<ROOT>|identifiers|<ListIndex>",
                    NodeClass::Literal(LiteralType::String),
                    Some(Literal::String(format!("id-{}", index))),
                ),
            ));
            links.push((1, id, Relation::Index(*index)));
        }
        MessageObjectTree::from_graph(REACTION, Arborescence::from_parts(nodes, links).unwrap()).unwrap()
    }

    #[test]
    fn test_reduce_sorts_list_children() {
        let registry = fixtures::registry();
        let message = identifiers_tree(&[1, 0, 2]).reduce_message(&registry).unwrap();
        assert_eq!(
            message.get("identifiers"),
            Some(&Value::List(vec![
                Value::string("id-0"),
                Value::string("id-1"),
                Value::string("id-2")
            ]))
        );
    }

    #[test]
    fn test_reduce_rejects_gaps() {
        let registry = fixtures::registry();
        let err = identifiers_tree(&[0, 2]).reduce(&registry).unwrap_err();
        assert_eq!(
            err,
            TreeError::SequenceNotContiguous {
                path: "<ROOT>|identifiers".into(),
                indices: vec![0, 2],
            }
        );
    }

    #[test]
    fn test_enum_parent_is_malformed() {
        let registry = fixtures::registry();
        let nodes = vec![
            (0, node(ROOT_PATH, ROOT_PATH, NodeClass::Message(REACTION.into()), None)),
            (1, node("<ROOT>|x", "<ROOT>|x", NodeClass::Enum(WORKUP_TYPE.into()), None)),
            (2, node("<ROOT>|x|y", "<ROOT>|x|y", NodeClass::Literal(LiteralType::Int), Some(Literal::Int(1)))),
        ];
        let links = vec![(0, 1, Relation::Field("x".into())), (1, 2, Relation::Field("y".into()))];
        let mot = MessageObjectTree::from_graph(REACTION, Arborescence::from_parts(nodes, links).unwrap()).unwrap();
        assert!(matches!(mot.reduce(&registry), Err(TreeError::MalformedTree(_))));
    }

    #[test]
    fn test_leaf_without_value() {
        let registry = fixtures::registry();
        let nodes = vec![
            (0, node(ROOT_PATH, ROOT_PATH, NodeClass::Message(REACTION.into()), None)),
            (1, node("<ROOT>|raw", "<ROOT>|raw", NodeClass::Literal(LiteralType::Bytes), None)),
        ];
        let links = vec![(0, 1, Relation::Field("raw".into()))];
        let mot = MessageObjectTree::from_graph(REACTION, Arborescence::from_parts(nodes, links).unwrap()).unwrap();
        assert_eq!(
            mot.reduce(&registry),
            Err(TreeError::MissingLeafValue("<ROOT>|raw".into()))
        );
    }

    #[test]
    fn test_root_only_reduces_to_empty_message() {
        let registry = fixtures::registry();
        let nodes = vec![(0, node(ROOT_PATH, ROOT_PATH, NodeClass::Message(REACTION.into()), None))];
        let mot =
            MessageObjectTree::from_graph(REACTION, Arborescence::from_parts(nodes, Vec::new()).unwrap()).unwrap();
        assert_eq!(mot.reduce_message(&registry).unwrap(), Message::new(REACTION));
    }
}
