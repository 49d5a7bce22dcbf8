//! # Operation Stream
//!
//! Discrete edit requests as they arrive from a client, in serialized form:
//!
//! ```json
//! [
//!   { "op": "extend", "node": 0 },
//!   { "op": "set_value", "element": { "node": 3 }, "value": { "literal": { "kind": "string", "value": "water" } } },
//!   { "op": "union", "node": 7, "other": "compound-template" }
//! ]
//! ```
//!
//! `union` names another prototype by id; it is looked up through a
//! [`PrototypeSource`] when the operation is applied.

use crate::element::{ElementId, ElementState, ElementValue};
use crate::error::{PrototypeError, PrototypeResult};
use crate::tree::PrototypeTree;
use ordtree_tree::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Extend { node: NodeId },
    Remove { node: NodeId },
    Detach { node: NodeId },
    Union { node: NodeId, other: String },
    SetValue { element: ElementId, value: ElementValue },
    SetState { element: ElementId, state: ElementState },
}

/// What applying an operation did to the tree
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Changed,
    /// Nothing to do, or an ignored change to a fixed element
    Unchanged,
    /// The tree is untouched; the extracted subtree is returned
    Detached(PrototypeTree),
}

/// Where `union` operations find the trees they refer to
pub trait PrototypeSource {
    fn load_prototype(&mut self, id: &str) -> PrototypeResult<PrototypeTree>;
}

impl PrototypeSource for HashMap<String, PrototypeTree> {
    fn load_prototype(&mut self, id: &str) -> PrototypeResult<PrototypeTree> {
        self.get(id)
            .cloned()
            .ok_or_else(|| PrototypeError::UnknownPrototype(id.to_string()))
    }
}

impl Operation {
    /// Apply to `tree`. On error the tree may be partly changed; callers
    /// wanting atomicity go through `EditSession`.
    pub fn apply(&self, tree: &mut PrototypeTree, source: &mut dyn PrototypeSource) -> PrototypeResult<Effect> {
        let changed = match self {
            Operation::Extend { node } => !tree.extend(*node)?.is_empty(),
            Operation::Remove { node } => {
                tree.remove(*node)?;
                true
            }
            Operation::Detach { node } => return Ok(Effect::Detached(tree.detach(*node)?)),
            Operation::Union { node, other } => {
                let other = source.load_prototype(other)?;
                tree.union(*node, &other)?;
                true
            }
            Operation::SetValue { element, value } => tree.change_element_value(*element, value.clone())?,
            Operation::SetState { element, state } => tree.change_element_state(*element, *state)?,
        };
        Ok(if changed { Effect::Changed } else { Effect::Unchanged })
    }

    /// Short label for history entries
    pub fn description(&self) -> String {
        match self {
            Operation::Extend { node } => format!("extend node {}", node),
            Operation::Remove { node } => format!("remove node {}", node),
            Operation::Detach { node } => format!("detach node {}", node),
            Operation::Union { node, other } => format!("union '{}' into node {}", other, node),
            Operation::SetValue { element, .. } => format!("set value of {}", element),
            Operation::SetState { element, state } => format!("set {} to {:?}", element, state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_json_shape() {
        let ops: Vec<Operation> = serde_json::from_value(json!([
            { "op": "extend", "node": 0 },
            { "op": "set_value", "element": { "edge": [2, 5] }, "value": { "key": "solvent" } },
            { "op": "set_state", "element": { "node": 4 }, "state": "NodePreset" },
            { "op": "union", "node": 7, "other": "tmpl" }
        ]))
        .unwrap();

        assert_eq!(ops[0], Operation::Extend { node: 0 });
        assert_eq!(
            ops[1],
            Operation::SetValue {
                element: ElementId::Edge(2, 5),
                value: ElementValue::Key("solvent".into())
            }
        );
        assert_eq!(
            ops[2],
            Operation::SetState {
                element: ElementId::Node(4),
                state: ElementState::NodePreset
            }
        );
        assert_eq!(ops[3].description(), "union 'tmpl' into node 7");
    }

    #[test]
    fn test_unknown_prototype() {
        let mut source: HashMap<String, PrototypeTree> = HashMap::new();
        let err = source.load_prototype("missing").unwrap_err();
        assert_eq!(err, PrototypeError::UnknownPrototype("missing".into()));
    }
}
