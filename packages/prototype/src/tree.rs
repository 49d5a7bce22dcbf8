//! # Prototype Tree
//!
//! An editable, partially filled message. The tree has the shape of a MOT,
//! and every node and edge carries an [`ElementState`] saying whether it is
//! fixed structure, a preset value, or a placeholder awaiting input.
//!
//! ```text
//! 0 <ROOT>                  NodeNonLiteral
//! ├─ name ─────────────── 1 NodePlaceholder     (EdgeAttrName)
//! └─ tags ─────────────── 2 NodeNonLiteral      (EdgeAttrName)
//!    └─ <ListIndex>0 ──── 3 NodeNonLiteral      (EdgePreset, index 0)
//!       └─ label ──────── 4 NodePreset "x"      (EdgeAttrName)
//! ```
//!
//! Each node maps to an MTT node, which is the oracle for what a node may
//! contain. Structural edits live in `edit.rs`, validation in `check.rs`.

use crate::element::{ElementState, PrototypeEdge, PrototypeNode};
use crate::error::{PrototypeError, PrototypeResult};
use ordtree_schema::{FieldKind, Message, TypeRegistry};
use ordtree_tree::path::{self, DICT_KEY, ROOT_PATH};
use ordtree_tree::{Arborescence, MessageObjectTree, MessageTypeTree, MotNode, MttNode, NodeId, Relation, TreeError};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct PrototypeTree {
    pub(crate) tree: Arborescence<PrototypeNode, PrototypeEdge>,
    pub(crate) mtt: Arc<MessageTypeTree>,
}

impl PrototypeTree {
    /// Root-only prototype
    pub fn new(mtt: Arc<MessageTypeTree>) -> Self {
        Self {
            tree: Arborescence::with_root(PrototypeNode::non_literal(ROOT_PATH)),
            mtt,
        }
    }

    /// Skeleton isomorphic to the MTT: every literal is a placeholder, every
    /// list has one element at index 0, every map one value without a key.
    pub fn from_mtt(mtt: Arc<MessageTypeTree>) -> PrototypeResult<Self> {
        let graph = mtt.graph();
        let mtt_root = graph.root_id()?;
        let mut tree = Arborescence::with_root(PrototypeNode::non_literal(ROOT_PATH));
        let mut placed = HashMap::from([(mtt_root, tree.root_id()?)]);

        // preorder places every parent before its children
        for mtt_id in graph.preorder(mtt_root).into_iter().skip(1) {
            let mtt_parent = graph
                .parent(mtt_id)
                .ok_or_else(|| TreeError::malformed(format!("MTT node {} has no parent", mtt_id)))?;
            let parent_kind = graph.node(mtt_parent)?.kind;
            let mtt_node = graph.node(mtt_id)?;

            let edge = if parent_kind.is_list() {
                PrototypeEdge::index(0)
            } else if parent_kind.is_map() {
                PrototypeEdge::key(ElementState::EdgePlaceholder, None)
            } else {
                PrototypeEdge::attr_name(mtt_node.relation.clone().unwrap_or_default())
            };
            let pt_parent = placed
                .get(&mtt_parent)
                .copied()
                .ok_or(TreeError::NodeNotFound(mtt_parent))?;
            let id = tree.add_child(pt_parent, edge, initial_node(mtt_node))?;
            placed.insert(mtt_id, id);
        }
        Ok(Self { tree, mtt })
    }

    /// Every node present in the MOT becomes preset (literals) or fixed
    /// structure; every edge keeps its concrete index or key.
    pub fn from_mot(mot: &MessageObjectTree, mtt: Arc<MessageTypeTree>) -> PrototypeResult<Self> {
        if mot.root_type() != mtt.root_type() {
            return Err(PrototypeError::RootTypeMismatch {
                expected: mtt.root_type().to_string(),
                found: mot.root_type().to_string(),
            });
        }
        let graph = mot.graph();
        let mut nodes = Vec::with_capacity(graph.len());
        for (id, node) in graph.iter() {
            let kind = mtt.kind_of(&node.mtt_path)?;
            let data = match (&node.value, kind.is_literal_like()) {
                (Some(value), true) => PrototypeNode::preset(node.mtt_path.clone(), value.clone()),
                (None, true) => PrototypeNode::placeholder(node.mtt_path.clone()),
                (_, false) => PrototypeNode::non_literal(node.mtt_path.clone()),
            };
            nodes.push((id, data));
        }
        let links = graph.links().map(|(parent, child, relation)| {
            let edge = match relation {
                Relation::Field(name) => PrototypeEdge::attr_name(name.clone()),
                Relation::Index(i) => PrototypeEdge::index(*i),
                Relation::Key(k) => PrototypeEdge::key(ElementState::EdgePreset, Some(k.clone())),
            };
            (parent, child, edge)
        });
        let tree = Arborescence::from_parts(nodes, links)?;
        Ok(Self { tree, mtt })
    }

    pub fn from_message(registry: &TypeRegistry, message: &Message) -> PrototypeResult<Self> {
        let mtt = Arc::new(MessageTypeTree::build(registry, message.type_name())?);
        let mot = MessageObjectTree::build(registry, &mtt, message)?;
        Self::from_mot(&mot, mtt)
    }

    /// Reassemble from decoded parts, checking every node maps into the MTT
    /// and every state agrees with the kind it sits on
    pub fn from_graph(
        mtt: Arc<MessageTypeTree>,
        tree: Arborescence<PrototypeNode, PrototypeEdge>,
    ) -> PrototypeResult<Self> {
        tree.validate()?;
        for (id, node) in tree.iter() {
            let kind = mtt.kind_of(&node.mtt_path)?;
            let fits = match node.state {
                ElementState::NodePlaceholder | ElementState::NodePreset => kind.is_literal_like(),
                ElementState::NodeNonLiteral => !kind.is_literal_like(),
                _ => false,
            };
            if !fits {
                return Err(malformed(format!(
                    "node {} at {} ({}) cannot be {:?}",
                    id, node.mtt_path, kind, node.state
                )));
            }
        }
        for (parent, child, edge) in tree.links() {
            let kind = mtt.kind_of(&tree.node(parent)?.mtt_path)?;
            let fits = match (&edge.relation, edge.state) {
                (Some(Relation::Index(_)), ElementState::EdgePreset) => kind.is_list(),
                (Some(Relation::Key(_)), ElementState::EdgePlaceholder | ElementState::EdgePreset)
                | (None, ElementState::EdgePlaceholder | ElementState::EdgePreset) => kind.is_map(),
                (Some(Relation::Field(_)), ElementState::EdgeAttrName) => kind == FieldKind::Message,
                _ => false,
            };
            if !fits {
                return Err(malformed(format!(
                    "edge {} -> {} ({:?}, {:?}) does not fit a {} parent",
                    parent, child, edge.relation, edge.state, kind
                )));
            }
        }
        Ok(Self { tree, mtt })
    }

    pub fn mtt(&self) -> &Arc<MessageTypeTree> {
        &self.mtt
    }

    pub fn graph(&self) -> &Arborescence<PrototypeNode, PrototypeEdge> {
        &self.tree
    }

    pub fn root_type(&self) -> &str {
        self.mtt.root_type()
    }

    pub fn root_id(&self) -> PrototypeResult<NodeId> {
        Ok(self.tree.root_id()?)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn node(&self, id: NodeId) -> PrototypeResult<&PrototypeNode> {
        Ok(self.tree.node(id)?)
    }

    pub fn edge(&self, parent: NodeId, child: NodeId) -> PrototypeResult<&PrototypeEdge> {
        self.tree
            .edge_between(parent, child)
            .ok_or(PrototypeError::EdgeNotFound(parent, child))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.parent(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.tree.children(id)
    }

    pub fn mtt_node(&self, id: NodeId) -> PrototypeResult<&MttNode> {
        Ok(self.mtt.get(&self.node(id)?.mtt_path)?)
    }

    pub fn kind_of(&self, id: NodeId) -> PrototypeResult<FieldKind> {
        Ok(self.mtt_node(id)?.kind)
    }

    pub fn placeholder_nodes(&self) -> Vec<NodeId> {
        self.tree
            .iter()
            .filter(|(_, node)| node.state == ElementState::NodePlaceholder)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn placeholder_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.tree
            .links()
            .filter(|(_, _, edge)| edge.state == ElementState::EdgePlaceholder)
            .map(|(parent, child, _)| (parent, child))
            .collect()
    }

    pub fn nodes_of_kind(&self, kinds: &[FieldKind]) -> Vec<NodeId> {
        self.tree
            .iter()
            .filter(|(_, node)| {
                self.mtt
                    .kind_of(&node.mtt_path)
                    .map(|kind| kinds.contains(&kind))
                    .unwrap_or(false)
            })
            .map(|(id, _)| id)
            .collect()
    }

    pub fn list_nodes(&self) -> Vec<NodeId> {
        self.nodes_of_kind(&[FieldKind::ListOfLiteral, FieldKind::ListOfMessage])
    }

    pub fn map_nodes(&self) -> Vec<NodeId> {
        self.nodes_of_kind(&[FieldKind::MapOfLiteral, FieldKind::MapOfMessage])
    }

    /// Concrete path of a node: field names, and the current index or key
    /// for list elements and map values.
    pub fn get_path(&self, id: NodeId) -> PrototypeResult<String> {
        let chain = self.tree.ancestry(id)?;
        let mut rendered = ROOT_PATH.to_string();
        for pair in chain.windows(2) {
            let edge = self.edge(pair[0], pair[1])?;
            let segment = match &edge.relation {
                Some(Relation::Field(name)) => name.clone(),
                Some(Relation::Index(i)) => i.to_string(),
                Some(Relation::Key(k)) => path::escape_key(k),
                None => DICT_KEY.to_string(),
            };
            rendered = path::join(&rendered, &segment);
        }
        Ok(rendered)
    }

    /// Fold into a MOT, turning edge values into concrete relations
    pub fn to_mot(&self) -> PrototypeResult<MessageObjectTree> {
        let root = self.tree.root_id()?;
        let mut nodes = Vec::with_capacity(self.tree.len());
        let mut links = Vec::with_capacity(self.tree.len());

        let mut stack = vec![(root, ROOT_PATH.to_string())];
        while let Some((id, concrete)) = stack.pop() {
            let node = self.tree.node(id)?;
            let mtt_node = self.mtt.get(&node.mtt_path)?;
            let value = match node.state {
                ElementState::NodeNonLiteral => None,
                _ => node.value.clone(),
            };
            nodes.push((
                id,
                MotNode {
                    path: concrete.clone(),
                    mtt_path: node.mtt_path.clone(),
                    class: mtt_node.class.clone(),
                    value,
                },
            ));

            for child in self.tree.children(id).iter().rev() {
                let edge = self.edge(id, *child)?;
                let relation = match (mtt_node.kind, &edge.relation) {
                    (kind, Some(r @ Relation::Index(_))) if kind.is_list() => r.clone(),
                    (kind, Some(r @ Relation::Key(_))) if kind.is_map() => r.clone(),
                    (kind, None) if kind.is_map() => {
                        return Err(PrototypeError::UnsetMapKey { parent: id, child: *child })
                    }
                    (FieldKind::Message, Some(r @ Relation::Field(_))) => r.clone(),
                    (_, other) => {
                        return Err(malformed(format!(
                            "edge {} -> {} ({:?}) does not fit a {} parent",
                            id, child, other, mtt_node.kind
                        )))
                    }
                };
                stack.push((*child, path::join(&concrete, &relation.segment())));
                links.push((id, *child, relation));
            }
        }
        links.sort_by_key(|(_, child, _)| *child);

        let graph = Arborescence::from_parts(nodes, links)?;
        Ok(MessageObjectTree::from_graph(self.mtt.root_type(), graph)?)
    }

    pub fn to_message(&self, registry: &TypeRegistry) -> PrototypeResult<Message> {
        Ok(self.to_mot()?.reduce_message(registry)?)
    }
}

fn malformed(reason: String) -> PrototypeError {
    PrototypeError::Tree(TreeError::malformed(reason))
}

/// State a freshly created node starts in
pub(crate) fn initial_node(mtt_node: &MttNode) -> PrototypeNode {
    if mtt_node.kind.is_literal_like() {
        PrototypeNode::placeholder(mtt_node.path.clone())
    } else {
        PrototypeNode::non_literal(mtt_node.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_schema::fixtures::{self, REACTION, TAGGED};
    use ordtree_schema::Literal;

    #[test]
    fn test_from_mtt_is_isomorphic() {
        let registry = fixtures::registry();
        let mtt = Arc::new(MessageTypeTree::build(&registry, TAGGED).unwrap());
        let pt = PrototypeTree::from_mtt(mtt.clone()).unwrap();
        assert_eq!(pt.len(), mtt.len());

        let paths: Vec<_> = pt.graph().iter().map(|(_, n)| n.mtt_path.clone()).collect();
        let mut expected: Vec<_> = mtt.nodes().map(|n| n.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        expected.sort();
        assert_eq!(sorted, expected);

        // the list element hangs off an index-0 preset edge
        let tags = pt.list_nodes()[0];
        let element = pt.children(tags)[0];
        let edge = pt.edge(tags, element).unwrap();
        assert_eq!(edge.state, ElementState::EdgePreset);
        assert_eq!(edge.relation, Some(Relation::Index(0)));
    }

    #[test]
    fn test_from_message_presets_values() {
        let registry = fixtures::registry();
        let message = fixtures::sample_reaction();
        let pt = PrototypeTree::from_message(&registry, &message).unwrap();

        assert!(pt.placeholder_nodes().is_empty());
        assert!(pt.placeholder_edges().is_empty());
        let yield_node = pt
            .graph()
            .iter()
            .find(|(_, n)| n.mtt_path == "<ROOT>|yield")
            .map(|(id, _)| id)
            .unwrap();
        assert_eq!(pt.node(yield_node).unwrap().value, Some(Literal::Float(87.5)));
        let rebuilt = pt.to_message(&registry).unwrap();
        assert_eq!(
            registry.message_to_json(&rebuilt).unwrap(),
            registry.message_to_json(&message).unwrap()
        );
    }

    #[test]
    fn test_get_path_uses_edge_values() {
        let registry = fixtures::registry();
        let pt = PrototypeTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
        let paths: Vec<String> = pt
            .graph()
            .node_ids()
            .map(|id| pt.get_path(id).unwrap())
            .collect();
        assert!(paths.contains(&"<ROOT>|workups|1|keep_phase".to_string()));
        assert!(paths.contains(&"<ROOT>|inputs|solvent|amount|units".to_string()));
    }

    #[test]
    fn test_unset_map_key_blocks_to_mot() {
        let registry = fixtures::registry();
        let mtt = Arc::new(MessageTypeTree::build(&registry, REACTION).unwrap());
        let pt = PrototypeTree::from_mtt(mtt).unwrap();
        assert!(matches!(pt.to_mot(), Err(PrototypeError::UnsetMapKey { .. })));
    }

    #[test]
    fn test_from_mot_rejects_other_root_type() {
        let registry = fixtures::registry();
        let mot = MessageObjectTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
        let mtt = Arc::new(MessageTypeTree::build(&registry, TAGGED).unwrap());
        assert_eq!(
            PrototypeTree::from_mot(&mot, mtt),
            Err(PrototypeError::RootTypeMismatch {
                expected: TAGGED.to_string(),
                found: REACTION.to_string(),
            })
        );
    }

    #[test]
    fn test_from_graph_checks_states_against_kinds() {
        let registry = fixtures::registry();
        let mtt = Arc::new(MessageTypeTree::build(&registry, TAGGED).unwrap());
        let pt = PrototypeTree::from_mtt(mtt.clone()).unwrap();
        assert!(PrototypeTree::from_graph(mtt.clone(), pt.graph().clone()).is_ok());

        let name = pt
            .graph()
            .iter()
            .find(|(_, n)| n.mtt_path == "<ROOT>|name")
            .map(|(id, _)| id)
            .unwrap();
        let mut graph = pt.graph().clone();
        graph.node_mut(name).unwrap().state = ElementState::NodeNonLiteral;
        assert!(matches!(
            PrototypeTree::from_graph(mtt.clone(), graph),
            Err(PrototypeError::Tree(TreeError::MalformedTree(_)))
        ));

        let tags = pt.list_nodes()[0];
        let element = pt.children(tags)[0];
        let mut graph = pt.graph().clone();
        graph.edge_mut(element).unwrap().state = ElementState::EdgePlaceholder;
        assert!(matches!(
            PrototypeTree::from_graph(mtt.clone(), graph),
            Err(PrototypeError::Tree(TreeError::MalformedTree(_)))
        ));

        let mut graph = pt.graph().clone();
        graph.node_mut(tags).unwrap().state = ElementState::NodePreset;
        assert!(PrototypeTree::from_graph(mtt, graph).is_err());
    }

    #[test]
    fn test_keys_with_delimiters_stay_distinct() {
        let registry = fixtures::registry();
        let mut notes = std::collections::BTreeMap::new();
        notes.insert("x".to_string(), ordtree_schema::Value::string("plain"));
        notes.insert("x|y".to_string(), ordtree_schema::Value::string("piped"));
        let message = Message::new(REACTION).with("notes", ordtree_schema::Value::Map(notes));

        let pt = PrototypeTree::from_message(&registry, &message).unwrap();
        let paths: Vec<String> = pt.graph().node_ids().map(|id| pt.get_path(id).unwrap()).collect();
        assert!(paths.contains(&r"<ROOT>|notes|x\|y".to_string()));
        assert_eq!(
            registry.message_to_json(&pt.to_message(&registry).unwrap()).unwrap(),
            registry.message_to_json(&message).unwrap()
        );
    }
}
