//! Structural edits and element changes on a [`PrototypeTree`].
//!
//! Every operation checks everything it needs before touching the tree, so a
//! failed edit leaves the tree as it was. Changes aimed at fixed elements are
//! not errors: they are logged and reported as `false`.

use crate::element::{ElementId, ElementState, ElementValue, PrototypeEdge};
use crate::error::{PrototypeError, PrototypeResult};
use crate::tree::{initial_node, PrototypeTree};
use ordtree_tree::{NodeId, Relation};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

impl PrototypeTree {
    /// Add the children the schema allows under `node`.
    ///
    /// Message nodes get each missing field once; list and map nodes get one
    /// new element per call. Literal nodes are left alone. Returns the ids of
    /// the added nodes.
    pub fn extend(&mut self, node: NodeId) -> PrototypeResult<Vec<NodeId>> {
        let mtt_node = self.mtt_node(node)?.clone();
        if mtt_node.kind.is_literal_like() {
            return Ok(Vec::new());
        }
        info!(
            "extending node {} ({}), current tree size: {}",
            node,
            self.get_path(node)?,
            self.tree.len()
        );

        let mtt_children: Vec<_> = self.mtt.children(&mtt_node.path)?.into_iter().cloned().collect();
        let mut added = Vec::new();
        for mtt_child in &mtt_children {
            let existing = self.tree.children(node).len();
            let edge = if mtt_node.kind.is_list() {
                PrototypeEdge::index(existing)
            } else if mtt_node.kind.is_map() {
                PrototypeEdge::key(ElementState::EdgePlaceholder, Some(self.fresh_key(node)))
            } else {
                let name = mtt_child.relation.clone().unwrap_or_default();
                if self.field_child(node, &name).is_some() {
                    debug!("field {} already present under node {}, skipping", name, node);
                    continue;
                }
                PrototypeEdge::attr_name(name)
            };
            added.push(self.tree.add_child(node, edge, initial_node(mtt_child))?);
        }
        Ok(added)
    }

    fn field_child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.tree.children(node).iter().copied().find(|child| {
            matches!(self.tree.edge(*child), Some(PrototypeEdge { relation: Some(Relation::Field(f)), .. }) if f == name)
        })
    }

    fn sibling_keys(&self, parent: NodeId, except: Option<NodeId>) -> BTreeSet<String> {
        self.tree
            .children(parent)
            .iter()
            .filter(|child| Some(**child) != except)
            .filter_map(|child| self.tree.edge(*child))
            .filter_map(|edge| edge.relation.as_ref().and_then(Relation::key))
            .map(str::to_string)
            .collect()
    }

    /// Synthetic key not used by any sibling
    fn fresh_key(&self, parent: NodeId) -> String {
        let taken = self.sibling_keys(parent, None);
        let mut n = self.tree.children(parent).len();
        loop {
            let key = format!("key{}", n);
            if !taken.contains(&key) {
                return key;
            }
            n += 1;
        }
    }

    /// Delete `node` and its descendants. Remaining list siblings are
    /// re-indexed to `0..n` in their previous order.
    pub fn remove(&mut self, node: NodeId) -> PrototypeResult<Vec<NodeId>> {
        self.node(node)?;
        let parent = self.tree.parent(node).ok_or(PrototypeError::CannotRemoveRoot)?;
        let parent_is_list = self.kind_of(parent)?.is_list();

        let removed = self.tree.remove_subtree(node)?;
        info!("removed node {} and {} descendants", node, removed.len() - 1);

        if parent_is_list {
            self.reindex(parent);
        }
        Ok(removed)
    }

    fn reindex(&mut self, list: NodeId) {
        let mut elements: Vec<(usize, usize, NodeId)> = self
            .tree
            .children(list)
            .iter()
            .enumerate()
            .map(|(position, child)| {
                let index = self.tree.edge(*child).and_then(|e| e.relation.as_ref()).and_then(Relation::index);
                (index.unwrap_or(usize::MAX), position, *child)
            })
            .collect();
        elements.sort();
        for (new_index, (_, _, child)) in elements.into_iter().enumerate() {
            if let Some(edge) = self.tree.edge_mut(child) {
                edge.relation = Some(Relation::Index(new_index));
            }
        }
    }

    /// Copy of the subtree under `node`; the source is not changed
    pub fn detach(&self, node: NodeId) -> PrototypeResult<PrototypeTree> {
        let tree = self.tree.extract(node)?;
        Ok(PrototypeTree {
            tree,
            mtt: self.mtt.clone(),
        })
    }

    /// Put `other` in place of the childless `node`.
    ///
    /// `other`'s root must have the same class as `node`. Its nodes are
    /// re-pointed at the MTT paths under `node` and given fresh ids. Returns
    /// the ids of the spliced nodes, starting with `node`.
    pub fn union(&mut self, node: NodeId, other: &PrototypeTree) -> PrototypeResult<Vec<NodeId>> {
        let target = self.mtt_node(node)?.clone();
        if !self.tree.is_leaf(node) {
            return Err(PrototypeError::UnionTargetNotEmpty(node));
        }
        let other_root = other.root_id()?;
        let other_root_mtt = other.mtt_node(other_root)?;
        if other_root_mtt.class != target.class {
            return Err(PrototypeError::IncompatibleUnion {
                target: target.class.to_string(),
                other: other_root_mtt.class.to_string(),
            });
        }

        // re-point at this tree's MTT; every rebased path must exist
        let prefix = other_root_mtt.path.clone();
        let mut rebased = other.tree.clone();
        let ids: Vec<NodeId> = rebased.node_ids().collect();
        for id in ids {
            let data = rebased.node_mut(id)?;
            let suffix = data.mtt_path.strip_prefix(prefix.as_str()).unwrap_or_default().to_string();
            let path = format!("{}{}", target.path, suffix);
            self.mtt.get(&path)?;
            data.mtt_path = path;
        }

        let mapping = self.tree.splice(node, &rebased)?;
        info!(
            "union of a {} node tree into node {}, tree size now {}",
            mapping.len(),
            node,
            self.tree.len()
        );
        let mut spliced: Vec<NodeId> = mapping.into_values().collect();
        spliced.sort_unstable();
        Ok(spliced)
    }

    /// Returns `false` when the element is fixed and nothing changed
    pub fn change_element_state(&mut self, element: ElementId, state: ElementState) -> PrototypeResult<bool> {
        match element {
            ElementId::Node(id) => {
                let node = self.node(id)?;
                if node.state == ElementState::NodeNonLiteral {
                    warn!("changing state of a NodeNonLiteral node {}, ignoring", id);
                    return Ok(false);
                }
                if !matches!(state, ElementState::NodePlaceholder | ElementState::NodePreset) {
                    return Err(PrototypeError::InvalidState { element, state });
                }
                self.tree.node_mut(id)?.state = state;
            }
            ElementId::Edge(parent, child) => {
                let edge = self.edge(parent, child)?;
                if edge.state == ElementState::EdgeAttrName || edge.is_list_index() {
                    warn!("changing state of a fixed edge {} -> {}, ignoring", parent, child);
                    return Ok(false);
                }
                if !matches!(state, ElementState::EdgePlaceholder | ElementState::EdgePreset) {
                    return Err(PrototypeError::InvalidState { element, state });
                }
                if let Some(edge) = self.tree.edge_mut(child) {
                    edge.state = state;
                }
            }
        }
        Ok(true)
    }

    /// Returns `false` when the element is fixed and nothing changed.
    ///
    /// Node values must fit the node's class; map keys must be unique among
    /// siblings.
    pub fn change_element_value(&mut self, element: ElementId, value: ElementValue) -> PrototypeResult<bool> {
        match element {
            ElementId::Node(id) => {
                if self.node(id)?.state == ElementState::NodeNonLiteral {
                    warn!("changing value of a NodeNonLiteral node {}, ignoring", id);
                    return Ok(false);
                }
                let class = &self.mtt_node(id)?.class;
                let literal = match value {
                    ElementValue::Literal(literal) if literal.fits(class) => literal,
                    ElementValue::Literal(literal) => {
                        return Err(PrototypeError::ValueTypeMismatch {
                            element,
                            expected: class.to_string(),
                            found: literal.type_name().to_string(),
                        })
                    }
                    ElementValue::Key(_) => {
                        return Err(PrototypeError::ValueTypeMismatch {
                            element,
                            expected: class.to_string(),
                            found: "map key".to_string(),
                        })
                    }
                };
                self.tree.node_mut(id)?.value = Some(literal);
            }
            ElementId::Edge(parent, child) => {
                let edge = self.edge(parent, child)?;
                if edge.state == ElementState::EdgeAttrName || edge.is_list_index() {
                    warn!("changing value of a fixed edge {} -> {}, ignoring", parent, child);
                    return Ok(false);
                }
                let ElementValue::Key(key) = value else {
                    return Err(PrototypeError::ValueTypeMismatch {
                        element,
                        expected: "map key".to_string(),
                        found: "literal".to_string(),
                    });
                };
                if self.sibling_keys(parent, Some(child)).contains(&key) {
                    return Err(PrototypeError::DuplicateMapKey { parent, key });
                }
                if let Some(edge) = self.tree.edge_mut(child) {
                    edge.relation = Some(Relation::Key(key));
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PrototypeNode;
    use ordtree_schema::fixtures::{self, REACTION, TAGGED};
    use ordtree_schema::{FieldKind, Literal};
    use ordtree_tree::MessageTypeTree;
    use std::sync::Arc;

    fn tagged() -> PrototypeTree {
        let registry = fixtures::registry();
        PrototypeTree::new(Arc::new(MessageTypeTree::build(&registry, TAGGED).unwrap()))
    }

    #[test]
    fn test_extend_root_adds_each_field_once() {
        let mut pt = tagged();
        let added = pt.extend(0).unwrap();
        assert_eq!(added.len(), 4);
        assert!(pt.extend(0).unwrap().is_empty());
        assert_eq!(pt.len(), 5);
    }

    #[test]
    fn test_extend_list_appends_index() {
        let mut pt = tagged();
        pt.extend(0).unwrap();
        let tags = pt.nodes_of_kind(&[FieldKind::ListOfMessage])[0];
        let first = pt.extend(tags).unwrap();
        let second = pt.extend(tags).unwrap();
        assert_eq!(pt.edge(tags, first[0]).unwrap().relation, Some(Relation::Index(0)));
        assert_eq!(pt.edge(tags, second[0]).unwrap().relation, Some(Relation::Index(1)));
    }

    #[test]
    fn test_extend_literal_is_noop() {
        let mut pt = tagged();
        let added = pt.extend(0).unwrap();
        assert!(pt.extend(added[0]).unwrap().is_empty());
    }

    #[test]
    fn test_map_extend_uses_fresh_placeholder_keys() {
        let registry = fixtures::registry();
        let mut pt = PrototypeTree::new(Arc::new(MessageTypeTree::build(&registry, REACTION).unwrap()));
        pt.extend(0).unwrap();
        let notes = pt.nodes_of_kind(&[FieldKind::MapOfLiteral])[0];
        let a = pt.extend(notes).unwrap()[0];
        let b = pt.extend(notes).unwrap()[0];

        let edge_a = pt.edge(notes, a).unwrap();
        assert_eq!(edge_a.state, ElementState::EdgePlaceholder);
        assert_ne!(edge_a.relation, pt.edge(notes, b).unwrap().relation);

        let err = pt
            .change_element_value(ElementId::Edge(notes, b), ElementValue::Key("key0".into()))
            .unwrap_err();
        assert_eq!(
            err,
            PrototypeError::DuplicateMapKey {
                parent: notes,
                key: "key0".into()
            }
        );
    }

    #[test]
    fn test_fixed_elements_ignore_changes() {
        let mut pt = tagged();
        pt.extend(0).unwrap();
        let before = pt.clone();

        let changed = pt
            .change_element_value(ElementId::Node(0), ElementValue::Literal(Literal::Int(1)))
            .unwrap();
        assert!(!changed);
        let name = pt.children(0)[0];
        let changed = pt
            .change_element_state(ElementId::Edge(0, name), ElementState::EdgePlaceholder)
            .unwrap();
        assert!(!changed);
        assert_eq!(pt, before);
    }

    #[test]
    fn test_value_type_checked() {
        let mut pt = tagged();
        let added = pt.extend(0).unwrap();
        let name = added[0];
        let err = pt
            .change_element_value(ElementId::Node(name), ElementValue::Literal(Literal::Int(3)))
            .unwrap_err();
        assert!(matches!(err, PrototypeError::ValueTypeMismatch { .. }));

        assert!(pt
            .change_element_value(ElementId::Node(name), ElementValue::Literal(Literal::String("x".into())))
            .unwrap());
        assert_eq!(pt.node(name).unwrap().value, Some(Literal::String("x".into())));
    }

    #[test]
    fn test_remove_root_rejected() {
        let mut pt = tagged();
        assert_eq!(pt.remove(0), Err(PrototypeError::CannotRemoveRoot));
    }

    #[test]
    fn test_union_rebases_paths() {
        let registry = fixtures::registry();
        let mut pt = tagged();
        pt.extend(0).unwrap();
        let tags = pt.list_nodes()[0];
        let element = pt.extend(tags).unwrap()[0];

        let mut label = PrototypeTree::new(Arc::new(MessageTypeTree::build(&registry, fixtures::TAG).unwrap()));
        let label_node = label.extend(0).unwrap()[0];
        label
            .change_element_value(ElementId::Node(label_node), ElementValue::Literal(Literal::String("x".into())))
            .unwrap();

        let spliced = pt.union(element, &label).unwrap();
        assert_eq!(spliced[0], element);
        let child = pt.children(element)[0];
        assert_eq!(
            pt.node(child).unwrap(),
            &PrototypeNode {
                state: ElementState::NodePlaceholder,
                value: Some(Literal::String("x".into())),
                mtt_path: "<ROOT>|tags|<ListIndex>|label".into(),
            }
        );
        assert_eq!(pt.get_path(child).unwrap(), "<ROOT>|tags|0|label");
    }
}
