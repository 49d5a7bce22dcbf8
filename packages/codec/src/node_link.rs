//! # Node-Link Layout
//!
//! The portable graph shape every tree is written as:
//!
//! ```json
//! {
//!   "directed": true,
//!   "multigraph": false,
//!   "graph": { "tree": "prototype", "root_message_type": "ord.Reaction" },
//!   "nodes": [ { "id": 0, ... }, { "id": 1, ... } ],
//!   "links": [ { "source": 0, "target": 1, ... } ]
//! }
//! ```
//!
//! Node and link attributes are flattened next to `id` and
//! `source`/`target`. `"edges"` is accepted in place of `"links"`.

use crate::error::{CodecError, CodecResult};
use ordtree_tree::{Arborescence, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of tree a graph holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeKind {
    Mtt,
    Mot,
    Prototype,
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TreeKind::Mtt => "mtt",
            TreeKind::Mot => "mot",
            TreeKind::Prototype => "prototype",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAttributes {
    pub tree: TreeKind,
    pub root_message_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry<N> {
    pub id: NodeId,
    #[serde(flatten)]
    pub data: N,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntry<L> {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(flatten)]
    pub data: L,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkGraph<N, L> {
    pub directed: bool,
    pub multigraph: bool,
    pub graph: GraphAttributes,
    pub nodes: Vec<NodeEntry<N>>,
    #[serde(alias = "edges")]
    pub links: Vec<LinkEntry<L>>,
}

impl<N, L> NodeLinkGraph<N, L> {
    /// Lay out `tree` with nodes in id order and links in child order
    pub fn from_tree<A, B>(
        kind: TreeKind,
        root_message_type: &str,
        tree: &Arborescence<A, B>,
        mut node: impl FnMut(NodeId, &A) -> N,
        mut link: impl FnMut(NodeId, NodeId, &B) -> L,
    ) -> Self {
        Self {
            directed: true,
            multigraph: false,
            graph: GraphAttributes {
                tree: kind,
                root_message_type: root_message_type.to_string(),
            },
            nodes: tree
                .iter()
                .map(|(id, data)| NodeEntry { id, data: node(id, data) })
                .collect(),
            links: tree
                .links()
                .map(|(source, target, data)| LinkEntry {
                    source,
                    target,
                    data: link(source, target, data),
                })
                .collect(),
        }
    }

    pub fn expect_kind(&self, kind: TreeKind) -> CodecResult<()> {
        if self.graph.tree != kind {
            return Err(CodecError::WrongTreeKind {
                expected: kind.to_string(),
                found: self.graph.tree.to_string(),
            });
        }
        Ok(())
    }

    /// Rebuild the arborescence, decoding each node and link
    pub fn to_tree<A, B>(
        &self,
        mut node: impl FnMut(NodeId, &N) -> CodecResult<A>,
        mut link: impl FnMut(NodeId, NodeId, &L) -> CodecResult<B>,
    ) -> CodecResult<Arborescence<A, B>> {
        let nodes = self
            .nodes
            .iter()
            .map(|entry| Ok((entry.id, node(entry.id, &entry.data)?)))
            .collect::<CodecResult<Vec<_>>>()?;
        let links = self
            .links
            .iter()
            .map(|entry| Ok((entry.source, entry.target, link(entry.source, entry.target, &entry.data)?)))
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Arborescence::from_parts(nodes, links)?)
    }
}

impl<N: Serialize, L: Serialize> NodeLinkGraph<N, L> {
    pub fn to_json(&self) -> CodecResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string(&self) -> CodecResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<N: for<'de> Deserialize<'de>, L: for<'de> Deserialize<'de>> NodeLinkGraph<N, L> {
    pub fn from_json(json: serde_json::Value) -> CodecResult<Self> {
        Ok(serde_json::from_value(json)?)
    }

    pub fn from_json_str(json: &str) -> CodecResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_tree::TreeError;
    use serde_json::json;

    type Plain = NodeLinkGraph<serde_json::Map<String, serde_json::Value>, serde_json::Map<String, serde_json::Value>>;

    #[test]
    fn test_edges_alias_accepted() {
        let graph = Plain::from_json(json!({
            "directed": true,
            "multigraph": false,
            "graph": { "tree": "mot", "root_message_type": "ord.Tag" },
            "nodes": [ { "id": 0 }, { "id": 1, "x": 1 } ],
            "edges": [ { "source": 0, "target": 1 } ]
        }))
        .unwrap();
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.nodes[1].data.get("x"), Some(&json!(1)));
        assert!(graph.expect_kind(TreeKind::Prototype).is_err());
    }

    #[test]
    fn test_to_tree_rejects_two_roots() {
        let graph = Plain::from_json(json!({
            "directed": true,
            "multigraph": false,
            "graph": { "tree": "mot", "root_message_type": "ord.Tag" },
            "nodes": [ { "id": 0 }, { "id": 1 } ],
            "links": []
        }))
        .unwrap();
        let result = graph.to_tree(|_, _| Ok(()), |_, _, _| Ok(()));
        assert!(matches!(result, Err(CodecError::Tree(TreeError::MalformedTree(_)))));
    }
}
