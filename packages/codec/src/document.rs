//! Persisted prototype documents
//!
//! A document is the unit of storage: a named, versioned prototype in
//! node-link form plus its timestamps. Versions are free-form labels; a
//! document derived from another records the parent's label in
//! `from_version`.

use crate::codec::{decode_prototype, encode_prototype, PrototypeGraph};
use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, Utc};
use ordtree_prototype::PrototypeTree;
use ordtree_schema::TypeRegistry;
use ordtree_tree::MttCache;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeDocument {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub from_version: Option<String>,
    pub root_message_type: String,
    pub node_link_data: PrototypeGraph,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

impl PrototypeDocument {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        node_link_data: PrototypeGraph,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            from_version: None,
            root_message_type: node_link_data.graph.root_message_type.clone(),
            node_link_data,
            time_created: now,
            time_modified: now,
        }
    }

    pub fn from_tree(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        tree: &PrototypeTree,
    ) -> Self {
        Self::new(id, name, version, encode_prototype(tree))
    }

    pub fn to_tree(&self, registry: &TypeRegistry, cache: &mut MttCache) -> CodecResult<PrototypeTree> {
        if self.root_message_type != self.node_link_data.graph.root_message_type {
            return Err(CodecError::WrongTreeKind {
                expected: self.root_message_type.clone(),
                found: self.node_link_data.graph.root_message_type.clone(),
            });
        }
        decode_prototype(registry, cache, &self.node_link_data)
    }

    /// Replace the stored tree and bump `time_modified`
    pub fn update_tree(&mut self, tree: &PrototypeTree) {
        self.node_link_data = encode_prototype(tree);
        self.root_message_type = tree.root_type().to_string();
        self.time_modified = Utc::now();
    }

    /// New document with the same content whose parent is this version
    pub fn derive(&self, id: impl Into<String>, version: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: self.name.clone(),
            version: version.into(),
            from_version: Some(self.version.clone()),
            root_message_type: self.root_message_type.clone(),
            node_link_data: self.node_link_data.clone(),
            time_created: now,
            time_modified: now,
        }
    }

    pub fn load(path: &Path) -> CodecResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CodecError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> CodecResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| CodecError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_schema::fixtures;

    #[test]
    fn test_derive_links_versions() {
        let registry = fixtures::registry();
        let tree = PrototypeTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
        let doc = PrototypeDocument::from_tree("suzuki", "Suzuki Reaction", "draft apple", &tree);
        assert_eq!(doc.root_message_type, fixtures::REACTION);

        let child = doc.derive("suzuki-2", "draft banana");
        assert_eq!(child.from_version.as_deref(), Some("draft apple"));
        assert_eq!(child.node_link_data, doc.node_link_data);
        assert!(child.time_created >= doc.time_created);
    }

    #[test]
    fn test_document_json_round_trip() {
        let registry = fixtures::registry();
        let mut cache = MttCache::new();
        let tree = PrototypeTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
        let doc = PrototypeDocument::from_tree("suzuki", "Suzuki Reaction", "v1", &tree);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suzuki.json");
        doc.save(&path).unwrap();
        let loaded = PrototypeDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(loaded.to_tree(&registry, &mut cache).unwrap(), tree);
    }
}
