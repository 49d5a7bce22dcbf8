//! # Edit Session
//!
//! One client's exclusive handle on a prototype tree. Operations are applied
//! one at a time and either take effect completely or not at all.

use crate::error::PrototypeResult;
use crate::history::History;
use crate::operation::{Effect, Operation, PrototypeSource};
use crate::tree::PrototypeTree;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// The tree changed; `version` is the session version after the change
    Applied { version: u64 },
    /// Nothing changed
    Ignored,
    Detached(PrototypeTree),
}

pub struct EditSession {
    /// Session identifier
    pub id: String,
    tree: PrototypeTree,
    version: u64,
    history: History,
}

impl EditSession {
    pub fn new(id: impl Into<String>, tree: PrototypeTree) -> Self {
        Self::with_version(id, tree, 0)
    }

    /// Resume editing a tree that is already at `version`
    pub fn with_version(id: impl Into<String>, tree: PrototypeTree, version: u64) -> Self {
        Self {
            id: id.into(),
            tree,
            version,
            history: History::new(),
        }
    }

    pub fn tree(&self) -> &PrototypeTree {
        &self.tree
    }

    pub fn into_tree(self) -> PrototypeTree {
        self.tree
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Apply one operation. On error the tree is restored to its state
    /// before the call.
    pub fn apply(&mut self, op: &Operation, source: &mut dyn PrototypeSource) -> PrototypeResult<OperationOutcome> {
        let before = self.tree.clone();
        match op.apply(&mut self.tree, source) {
            Ok(Effect::Changed) => {
                self.history.record(before, op.description());
                self.version += 1;
                debug!("session {}: {} -> version {}", self.id, op.description(), self.version);
                Ok(OperationOutcome::Applied { version: self.version })
            }
            Ok(Effect::Unchanged) => Ok(OperationOutcome::Ignored),
            Ok(Effect::Detached(tree)) => Ok(OperationOutcome::Detached(tree)),
            Err(e) => {
                warn!("session {}: {} failed: {}", self.id, op.description(), e);
                self.tree = before;
                Err(e)
            }
        }
    }

    /// Apply a stream of operations as one undo step. If any operation fails
    /// the whole stream is rolled back.
    pub fn apply_all(
        &mut self,
        ops: &[Operation],
        source: &mut dyn PrototypeSource,
    ) -> PrototypeResult<Vec<OperationOutcome>> {
        let (start_tree, start_version) = (self.tree.clone(), self.version);
        self.history.begin_batch();

        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            match self.apply(op, source) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    self.history.cancel_batch();
                    self.tree = start_tree;
                    self.version = start_version;
                    return Err(e);
                }
            }
        }
        self.history.end_batch(Some(format!("{} operations", ops.len())));
        Ok(outcomes)
    }

    /// Returns `false` if there was nothing to undo
    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.tree);
        if undone {
            self.version += 1;
        }
        undone
    }

    /// Returns `false` if there was nothing to redo
    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.tree);
        if redone {
            self.version += 1;
        }
        redone
    }
}
