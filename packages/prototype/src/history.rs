//! # Undo/Redo History
//!
//! Snapshot history for a prototype tree.
//!
//! - Every recorded edit stores the tree as it was before the edit
//! - Undo swaps the current tree with the last snapshot and keeps the
//!   current one for redo
//! - Recording a new edit clears the redo side
//! - Batches group several edits into one undo step

use crate::tree::PrototypeTree;

#[derive(Debug, Clone)]
struct Entry {
    tree: PrototypeTree,
    description: Option<String>,
}

#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    /// 0 = unlimited
    max_levels: usize,
    /// Open batch; holds the snapshot taken before its first edit
    current_batch: Option<Option<Entry>>,
}

impl History {
    /// History keeping 100 undo levels
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record the tree as it was before an edit
    pub fn record(&mut self, before: PrototypeTree, description: impl Into<String>) {
        let entry = Entry {
            tree: before,
            description: Some(description.into()),
        };
        match &mut self.current_batch {
            Some(slot @ None) => *slot = Some(entry),
            Some(Some(_)) => {}
            None => self.push(entry),
        }
    }

    pub fn begin_batch(&mut self) {
        self.current_batch = Some(None);
    }

    /// Close the batch; an empty batch leaves no undo step
    pub fn end_batch(&mut self, description: Option<String>) {
        if let Some(Some(mut entry)) = self.current_batch.take() {
            if description.is_some() {
                entry.description = description;
            }
            self.push(entry);
        }
    }

    /// Drop the open batch without recording it
    pub fn cancel_batch(&mut self) {
        self.current_batch = None;
    }

    fn push(&mut self, entry: Entry) {
        self.undo_stack.push(entry);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Returns `false` if there was nothing to undo
    pub fn undo(&mut self, tree: &mut PrototypeTree) -> bool {
        let Some(mut entry) = self.undo_stack.pop() else {
            return false;
        };
        std::mem::swap(&mut entry.tree, tree);
        self.redo_stack.push(entry);
        true
    }

    /// Returns `false` if there was nothing to redo
    pub fn redo(&mut self, tree: &mut PrototypeTree) -> bool {
        let Some(mut entry) = self.redo_stack.pop() else {
            return false;
        };
        std::mem::swap(&mut entry.tree, tree);
        self.undo_stack.push(entry);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|entry| entry.description.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordtree_schema::fixtures::{self, TAGGED};
    use ordtree_tree::MessageTypeTree;
    use std::sync::Arc;

    fn tree() -> PrototypeTree {
        let registry = fixtures::registry();
        PrototypeTree::new(Arc::new(MessageTypeTree::build(&registry, TAGGED).unwrap()))
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::new();
        let mut pt = tree();
        let before = pt.clone();
        pt.extend(0).unwrap();
        let after = pt.clone();
        history.record(before.clone(), "extend node 0");

        assert!(history.undo(&mut pt));
        assert_eq!(pt, before);
        assert_eq!(history.redo_description(), Some("extend node 0"));

        assert!(history.redo(&mut pt));
        assert_eq!(pt, after);
        assert!(!history.redo(&mut pt));
    }

    #[test]
    fn test_batch_is_one_step() {
        let mut history = History::new();
        let mut pt = tree();
        let start = pt.clone();

        history.begin_batch();
        history.record(pt.clone(), "extend node 0");
        let tags = pt.extend(0).unwrap()[1];
        history.record(pt.clone(), "extend tags");
        pt.extend(tags).unwrap();
        history.end_batch(Some("add a tag".into()));

        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.undo_description(), Some("add a tag"));
        history.undo(&mut pt);
        assert_eq!(pt, start);
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = History::new();
        let mut pt = tree();
        history.record(pt.clone(), "first");
        history.undo(&mut pt);
        assert_eq!(history.redo_levels(), 1);
        history.record(pt.clone(), "second");
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut history = History::with_max_levels(2);
        let pt = tree();
        for i in 0..3 {
            history.record(pt.clone(), format!("edit {}", i));
        }
        assert_eq!(history.undo_levels(), 2);
        assert_eq!(history.undo_description(), Some("edit 2"));
    }
}
