//! Consistency checks and instantiation of a prototype into a message

use crate::element::{ElementId, ElementState, ElementValue};
use crate::error::{PrototypeError, PrototypeResult};
use crate::tree::PrototypeTree;
use ordtree_schema::{FieldKind, Message, TypeRegistry};
use ordtree_tree::{NodeId, Relation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Something that would stop the prototype from reducing to the message a
/// user expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    UnsetMapKey { parent: NodeId, child: NodeId },
    DuplicateMapKey { parent: NodeId, key: String },
    ListIndexGap { list: NodeId, indices: Vec<usize> },
    /// Preset literal without a value
    MissingValue { node: NodeId },
    OneofConflict {
        parent: NodeId,
        group: String,
        fields: Vec<String>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnsetMapKey { parent, child } => write!(f, "map edge {} -> {} has no key", parent, child),
            Violation::DuplicateMapKey { parent, key } => {
                write!(f, "key '{}' used more than once under node {}", key, parent)
            }
            Violation::ListIndexGap { list, indices } => {
                write!(f, "list node {} has indices {:?}, expected 0..{}", list, indices, indices.len())
            }
            Violation::MissingValue { node } => write!(f, "preset node {} has no value", node),
            Violation::OneofConflict { parent, group, fields } => write!(
                f,
                "node {} has more than one member of oneof '{}': {}",
                parent,
                group,
                fields.join(", ")
            ),
        }
    }
}

/// A value for one placeholder element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub element: ElementId,
    pub value: ElementValue,
}

impl PrototypeTree {
    /// Every violation in the tree, ordered by the node it was found at
    pub fn check(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for id in self.tree.root().map(|root| self.tree.preorder(root)).unwrap_or_default() {
            let Ok(node) = self.node(id) else { continue };
            if node.state == ElementState::NodePreset && node.value.is_none() {
                violations.push(Violation::MissingValue { node: id });
            }
            match self.kind_of(id) {
                Ok(kind) if kind.is_map() => self.check_map(id, &mut violations),
                Ok(kind) if kind.is_list() => self.check_list(id, &mut violations),
                Ok(FieldKind::Message) => self.check_oneofs(id, &mut violations),
                _ => {}
            }
        }
        violations
    }

    fn check_map(&self, map: NodeId, violations: &mut Vec<Violation>) {
        let mut seen = BTreeSet::new();
        for child in self.children(map) {
            match self.tree.edge(*child).and_then(|e| e.relation.as_ref()).and_then(Relation::key) {
                None => violations.push(Violation::UnsetMapKey {
                    parent: map,
                    child: *child,
                }),
                Some(key) if !seen.insert(key) => violations.push(Violation::DuplicateMapKey {
                    parent: map,
                    key: key.to_string(),
                }),
                Some(_) => {}
            }
        }
    }

    fn check_list(&self, list: NodeId, violations: &mut Vec<Violation>) {
        let mut indices: Vec<usize> = self
            .children(list)
            .iter()
            .map(|child| {
                self.tree
                    .edge(*child)
                    .and_then(|e| e.relation.as_ref())
                    .and_then(Relation::index)
                    .unwrap_or(usize::MAX)
            })
            .collect();
        indices.sort_unstable();
        if indices.iter().enumerate().any(|(i, index)| i != *index) {
            violations.push(Violation::ListIndexGap { list, indices });
        }
    }

    fn check_oneofs(&self, message: NodeId, violations: &mut Vec<Violation>) {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for child in self.children(message) {
            let Ok(mtt_node) = self.mtt_node(*child) else { continue };
            if let (Some(group), Some(field)) = (&mtt_node.oneof_group, &mtt_node.relation) {
                groups.entry(group.clone()).or_default().push(field.clone());
            }
        }
        for (group, fields) in groups {
            if fields.len() > 1 {
                violations.push(Violation::OneofConflict {
                    parent: message,
                    group,
                    fields,
                });
            }
        }
    }

    /// Fill placeholders and reduce to a message, leaving `self` untouched.
    ///
    /// Each fill must target a placeholder node or a placeholder map edge.
    pub fn instantiate(&self, registry: &TypeRegistry, fills: &[Fill]) -> PrototypeResult<Message> {
        let mut filled = self.clone();
        for fill in fills {
            let state = match fill.element {
                ElementId::Node(id) => filled.node(id)?.state,
                ElementId::Edge(parent, child) => filled.edge(parent, child)?.state,
            };
            if !matches!(state, ElementState::NodePlaceholder | ElementState::EdgePlaceholder) {
                return Err(PrototypeError::NotPlaceholder(fill.element));
            }
            filled.change_element_value(fill.element, fill.value.clone())?;
        }
        filled.to_message(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_schema::fixtures::{self, REACTION, TAGGED};
    use ordtree_schema::{Literal, Value};
    use ordtree_tree::MessageTypeTree;
    use std::sync::Arc;

    fn reaction() -> PrototypeTree {
        let registry = fixtures::registry();
        PrototypeTree::new(Arc::new(MessageTypeTree::build(&registry, REACTION).unwrap()))
    }

    #[test]
    fn test_oneof_members_conflict_until_one_removed() {
        let registry = fixtures::registry();
        let mut pt = PrototypeTree::new(Arc::new(MessageTypeTree::build(&registry, TAGGED).unwrap()));
        let added = pt.extend(0).unwrap();
        assert_eq!(
            pt.check(),
            vec![Violation::OneofConflict {
                parent: 0,
                group: "kind".into(),
                fields: vec!["a".into(), "b".into()],
            }]
        );
        let b = added[3];
        pt.remove(b).unwrap();
        assert!(pt.check().is_empty());
    }

    #[test]
    fn test_duplicate_keys_reported() {
        let mut pt = reaction();
        pt.extend(0).unwrap();
        let notes = pt.nodes_of_kind(&[FieldKind::MapOfLiteral])[0];
        let a = pt.extend(notes).unwrap()[0];
        let b = pt.extend(notes).unwrap()[0];
        let taken = pt.edge(notes, a).unwrap().relation.clone();
        pt.tree.edge_mut(b).unwrap().relation = taken;
        assert_eq!(
            pt.check(),
            vec![Violation::DuplicateMapKey {
                parent: notes,
                key: "key0".into()
            }]
        );
    }

    #[test]
    fn test_instantiate_fills_placeholders() {
        let registry = fixtures::registry();
        let mut pt = reaction();
        pt.extend(0).unwrap();
        let notes = pt.nodes_of_kind(&[FieldKind::MapOfLiteral])[0];
        let note = pt.extend(notes).unwrap()[0];
        // keep only the notes field
        for child in pt.children(0).to_vec() {
            if child != notes {
                pt.remove(child).unwrap();
            }
        }

        let fills = vec![
            Fill {
                element: ElementId::Edge(notes, note),
                value: ElementValue::Key("lab".into()),
            },
            Fill {
                element: ElementId::Node(note),
                value: ElementValue::Literal(Literal::String("B12".into())),
            },
        ];
        let message = pt.instantiate(&registry, &fills).unwrap();
        let Some(Value::Map(map)) = message.get("notes") else {
            panic!("notes not set")
        };
        assert_eq!(map.get("lab"), Some(&Value::string("B12")));
        // source untouched
        assert_eq!(pt.node(note).unwrap().value, None);
    }

    #[test]
    fn test_instantiate_rejects_fixed_target() {
        let registry = fixtures::registry();
        let pt = reaction();
        let fills = vec![Fill {
            element: ElementId::Node(0),
            value: ElementValue::Literal(Literal::Int(1)),
        }];
        assert_eq!(
            pt.instantiate(&registry, &fills),
            Err(PrototypeError::NotPlaceholder(ElementId::Node(0)))
        );
    }
}
