//! Encoding and decoding of MTTs, MOTs and prototype trees.
//!
//! Classes are written by name (`ord.Compound`, `string`, `list`) and
//! resolved through the registry on the way back in. Literal values are
//! written in their raw JSON form, bytes as base64.

use crate::error::{leaf_error, CodecError, CodecResult};
use crate::node_link::{NodeLinkGraph, TreeKind};
use ordtree_prototype::{ElementState, PrototypeEdge, PrototypeNode, PrototypeTree};
use ordtree_schema::{FieldKind, Literal, NodeClass, TypeRef, TypeRegistry};
use ordtree_tree::{MessageObjectTree, MessageTypeTree, MotNode, MttCache, MttNode, NodeId, Relation};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MttNodeRecord {
    pub path: String,
    pub kind: FieldKind,
    pub type_ref: TypeRef,
    pub class: String,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub oneof_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MttLinkRecord {
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotNodeRecord {
    pub path: String,
    pub mtt_path: String,
    pub class: String,
    #[serde(default)]
    pub value: Option<Json>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotLinkRecord {
    pub relation: Relation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeNodeRecord {
    pub state: ElementState,
    #[serde(default)]
    pub value: Option<Json>,
    pub mtt_path: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeLinkRecord {
    pub state: ElementState,
    #[serde(default)]
    pub relation: Option<Relation>,
}

pub type MttGraph = NodeLinkGraph<MttNodeRecord, MttLinkRecord>;
pub type MotGraph = NodeLinkGraph<MotNodeRecord, MotLinkRecord>;
pub type PrototypeGraph = NodeLinkGraph<PrototypeNodeRecord, PrototypeLinkRecord>;

fn decode_value(registry: &TypeRegistry, node: NodeId, class: &str, value: &Option<Json>) -> CodecResult<(NodeClass, Option<Literal>)> {
    let class = registry.resolve_class(class)?;
    let literal = match value {
        Some(json) if !json.is_null() => Some(Literal::from_json(&class, json).map_err(|e| leaf_error(node, e))?),
        _ => None,
    };
    Ok((class, literal))
}

pub fn encode_mtt(mtt: &MessageTypeTree) -> MttGraph {
    NodeLinkGraph::from_tree(
        TreeKind::Mtt,
        mtt.root_type(),
        mtt.graph(),
        |_, node| MttNodeRecord {
            path: node.path.clone(),
            kind: node.kind,
            type_ref: node.type_ref.clone(),
            class: node.class.to_string(),
            relation: node.relation.clone(),
            oneof_group: node.oneof_group.clone(),
        },
        |_, _, relation| MttLinkRecord {
            relation: relation.clone(),
        },
    )
}

pub fn decode_mtt(registry: &TypeRegistry, graph: &MttGraph) -> CodecResult<MessageTypeTree> {
    graph.expect_kind(TreeKind::Mtt)?;
    registry.message(&graph.graph.root_message_type)?;
    let tree = graph.to_tree(
        |_, record| {
            Ok(MttNode {
                path: record.path.clone(),
                kind: record.kind,
                type_ref: record.type_ref.clone(),
                class: registry.resolve_class(&record.class)?,
                relation: record.relation.clone(),
                oneof_group: record.oneof_group.clone(),
            })
        },
        |_, _, link| Ok(link.relation.clone()),
    )?;
    Ok(MessageTypeTree::from_graph(graph.graph.root_message_type.clone(), tree)?)
}

pub fn encode_mot(mot: &MessageObjectTree) -> MotGraph {
    NodeLinkGraph::from_tree(
        TreeKind::Mot,
        mot.root_type(),
        mot.graph(),
        |_, node| MotNodeRecord {
            path: node.path.clone(),
            mtt_path: node.mtt_path.clone(),
            class: node.class.to_string(),
            value: node.value.as_ref().map(Literal::to_json),
        },
        |_, _, relation| MotLinkRecord {
            relation: relation.clone(),
        },
    )
}

pub fn decode_mot(registry: &TypeRegistry, graph: &MotGraph) -> CodecResult<MessageObjectTree> {
    graph.expect_kind(TreeKind::Mot)?;
    registry.message(&graph.graph.root_message_type)?;
    let tree = graph.to_tree(
        |id, record| {
            let (class, value) = decode_value(registry, id, &record.class, &record.value)?;
            Ok(MotNode {
                path: record.path.clone(),
                mtt_path: record.mtt_path.clone(),
                class,
                value,
            })
        },
        |_, _, link| Ok(link.relation.clone()),
    )?;
    Ok(MessageObjectTree::from_graph(graph.graph.root_message_type.clone(), tree)?)
}

pub fn encode_prototype(prototype: &PrototypeTree) -> PrototypeGraph {
    let mtt = prototype.mtt();
    NodeLinkGraph::from_tree(
        TreeKind::Prototype,
        prototype.root_type(),
        prototype.graph(),
        |_, node| PrototypeNodeRecord {
            state: node.state,
            value: node.value.as_ref().map(Literal::to_json),
            mtt_path: node.mtt_path.clone(),
            // nodes are checked against the MTT when the tree is built
            class: mtt
                .get_node_class(&node.mtt_path)
                .map(NodeClass::to_string)
                .unwrap_or_default(),
        },
        |_, _, edge| PrototypeLinkRecord {
            state: edge.state,
            relation: edge.relation.clone(),
        },
    )
}

/// Decode a prototype, taking its MTT from `cache`
pub fn decode_prototype(registry: &TypeRegistry, cache: &mut MttCache, graph: &PrototypeGraph) -> CodecResult<PrototypeTree> {
    graph.expect_kind(TreeKind::Prototype)?;
    let mtt = cache.get_or_build(registry, &graph.graph.root_message_type)?;
    let tree = graph.to_tree(
        |id, record| {
            let (class, value) = decode_value(registry, id, &record.class, &record.value)?;
            let expected = mtt.get_node_class(&record.mtt_path)?;
            if &class != expected {
                return Err(CodecError::ClassMismatch {
                    node: id,
                    stored: class.to_string(),
                    expected: expected.to_string(),
                });
            }
            Ok(PrototypeNode {
                state: record.state,
                value,
                mtt_path: record.mtt_path.clone(),
            })
        },
        |_, _, link| {
            Ok(PrototypeEdge {
                state: link.state,
                relation: link.relation.clone(),
            })
        },
    )?;
    debug!(
        "decoded {} prototype with {} nodes",
        graph.graph.root_message_type,
        tree.len()
    );
    Ok(PrototypeTree::from_graph(mtt, tree)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_schema::fixtures::{self, REACTION};
    use serde_json::json;

    #[test]
    fn test_mtt_graph_round_trip() {
        let registry = fixtures::registry();
        let mtt = MessageTypeTree::build(&registry, REACTION).unwrap();
        let graph = encode_mtt(&mtt);
        assert_eq!(graph.nodes.len(), mtt.len());

        let text = graph.to_json_string().unwrap();
        let decoded = decode_mtt(&registry, &MttGraph::from_json_str(&text).unwrap()).unwrap();
        assert_eq!(decoded, mtt);
    }

    #[test]
    fn test_unregistered_class_is_unresolved() {
        let registry = fixtures::registry();
        let mot = MessageObjectTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
        let mut graph = encode_mot(&mot);
        graph.nodes[0].data.class = "ord.Missing".into();
        assert!(matches!(
            decode_mot(&registry, &graph),
            Err(CodecError::Schema(ordtree_schema::SchemaError::UnresolvedTypeReference(name))) if name == "ord.Missing"
        ));
    }

    #[test]
    fn test_bytes_written_as_base64() {
        let registry = fixtures::registry();
        let mot = MessageObjectTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
        let graph = encode_mot(&mot);
        let raw = graph.nodes.iter().find(|n| n.data.mtt_path == "<ROOT>|raw").unwrap();
        assert_eq!(raw.data.value, Some(json!("AJ+Slg==")));
    }
}
