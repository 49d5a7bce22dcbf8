//! # ordtree-prototype
//!
//! Editable prototype trees: a message object tree where every literal can be
//! a placeholder, every map key can be left open, and the structure can be
//! grown or pruned along the message type tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐    from_mtt / new     ┌────────────────┐
//! │ MessageType   │ ────────────────────► │                │
//! │ Tree (shared) │                       │ PrototypeTree  │ ◄── Operation
//! └───────────────┘    from_mot           │                │     (EditSession,
//! ┌───────────────┐ ────────────────────► │  extend        │      History)
//! │ MessageObject │                       │  remove        │
//! │ Tree          │ ◄──────────────────── │  detach/union  │
//! └───────────────┘    to_mot             │  check         │
//!         │                               └────────────────┘
//!         ▼ reduce
//!     Message
//! ```
//!
//! Structural elements (`NodeNonLiteral` nodes, `EdgeAttrName` edges and
//! list-index edges) never change; attempts are logged and ignored.

mod check;
mod edit;
mod element;
mod error;
mod history;
mod operation;
mod session;
mod tree;

pub use check::{Fill, Violation};
pub use element::{ElementId, ElementState, ElementValue, PrototypeEdge, PrototypeNode};
pub use error::{PrototypeError, PrototypeResult};
pub use history::History;
pub use operation::{Effect, Operation, PrototypeSource};
pub use session::{EditSession, OperationOutcome};
pub use tree::PrototypeTree;
