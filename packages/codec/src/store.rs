//! # Document Store
//!
//! Where persisted prototype documents live. `FileDocumentStore` keeps one
//! `<id>.json` file per document in a directory; `MemoryDocumentStore` is
//! for tests and short-lived tools.
//!
//! [`StoreSource`] lets an edit session resolve `union` targets by document
//! id.

use crate::document::PrototypeDocument;
use crate::error::{CodecError, CodecResult};
use ordtree_prototype::{PrototypeError, PrototypeResult, PrototypeSource, PrototypeTree};
use ordtree_schema::TypeRegistry;
use ordtree_tree::MttCache;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait DocumentStore {
    fn load(&self, id: &str) -> CodecResult<PrototypeDocument>;

    fn save(&mut self, document: &PrototypeDocument) -> CodecResult<()>;

    /// Returns `false` if there was no such document
    fn delete(&mut self, id: &str) -> CodecResult<bool>;

    /// Ids of all stored documents, sorted
    fn list(&self) -> CodecResult<Vec<String>>;
}

pub struct FileDocumentStore {
    dir: PathBuf,
}

impl FileDocumentStore {
    /// Store rooted at `dir`, created if missing
    pub fn open(dir: impl Into<PathBuf>) -> CodecResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| CodecError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> CodecResult<PathBuf> {
        if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id.starts_with('.') {
            return Err(CodecError::InvalidDocumentId(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self, id: &str) -> CodecResult<PrototypeDocument> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(CodecError::DocumentNotFound(id.to_string()));
        }
        PrototypeDocument::load(&path)
    }

    fn save(&mut self, document: &PrototypeDocument) -> CodecResult<()> {
        let path = self.path_for(&document.id)?;
        debug!("saving document {} to {}", document.id, path.display());
        document.save(&path)
    }

    fn delete(&mut self, id: &str) -> CodecResult<bool> {
        let path = self.path_for(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CodecError::io(path, e)),
        }
    }

    fn list(&self) -> CodecResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CodecError::io(&self.dir, e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CodecError::io(&self.dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: BTreeMap<String, PrototypeDocument>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, id: &str) -> CodecResult<PrototypeDocument> {
        self.documents
            .get(id)
            .cloned()
            .ok_or_else(|| CodecError::DocumentNotFound(id.to_string()))
    }

    fn save(&mut self, document: &PrototypeDocument) -> CodecResult<()> {
        self.documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    fn delete(&mut self, id: &str) -> CodecResult<bool> {
        Ok(self.documents.remove(id).is_some())
    }

    fn list(&self) -> CodecResult<Vec<String>> {
        Ok(self.documents.keys().cloned().collect())
    }
}

/// Resolves prototype ids against a document store
pub struct StoreSource<'a, S: DocumentStore> {
    store: &'a S,
    registry: &'a TypeRegistry,
    cache: &'a mut MttCache,
}

impl<'a, S: DocumentStore> StoreSource<'a, S> {
    pub fn new(store: &'a S, registry: &'a TypeRegistry, cache: &'a mut MttCache) -> Self {
        Self { store, registry, cache }
    }
}

impl<S: DocumentStore> PrototypeSource for StoreSource<'_, S> {
    fn load_prototype(&mut self, id: &str) -> PrototypeResult<PrototypeTree> {
        let loaded = self
            .store
            .load(id)
            .and_then(|document| document.to_tree(self.registry, self.cache));
        match loaded {
            Ok(tree) => Ok(tree),
            Err(CodecError::DocumentNotFound(_)) => Err(PrototypeError::UnknownPrototype(id.to_string())),
            Err(CodecError::Prototype(e)) => Err(e),
            Err(e) => Err(PrototypeError::SourceUnavailable {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_schema::fixtures;

    fn document(id: &str) -> PrototypeDocument {
        let registry = fixtures::registry();
        let tree = PrototypeTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
        PrototypeDocument::from_tree(id, "sample", "v1", &tree)
    }

    #[test]
    fn test_file_store_save_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileDocumentStore::open(dir.path().join("docs")).unwrap();
        store.save(&document("b")).unwrap();
        store.save(&document("a")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.load("a").unwrap().id, "a");
        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert!(matches!(store.load("a"), Err(CodecError::DocumentNotFound(_))));
    }

    #[test]
    fn test_file_store_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path()).unwrap();
        assert!(matches!(store.load("../x"), Err(CodecError::InvalidDocumentId(_))));
    }

    #[test]
    fn test_store_source_maps_missing_to_unknown() {
        let registry = fixtures::registry();
        let mut cache = MttCache::new();
        let store = MemoryDocumentStore::new();
        let mut source = StoreSource::new(&store, &registry, &mut cache);
        assert_eq!(
            source.load_prototype("nope"),
            Err(PrototypeError::UnknownPrototype("nope".into()))
        );
    }
}
