//! # ordtree tree
//!
//! Two of the three tree views of a message:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ MessageTypeTree (MTT)                       │
//! │  - one node per reachable field path        │
//! │  - kind, class and oneof group per node     │
//! │  - built once per type, shared via MttCache │
//! └─────────────────────────────────────────────┘
//!                     ↓ guides
//! ┌─────────────────────────────────────────────┐
//! │ MessageObjectTree (MOT)                     │
//! │  - one node per populated value             │
//! │  - build(message) / reduce() → message      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Both sit on [`Arborescence`], the rooted out-tree storage also used by the
//! prototype tree.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ordtree_tree::{MessageObjectTree, MttCache};
//!
//! let mut cache = MttCache::new();
//! let mtt = cache.get_or_build(&registry, "ord.Reaction")?;
//! let mot = MessageObjectTree::build(&registry, &mtt, &reaction)?;
//! let back = mot.reduce_message(&registry)?;
//! ```

mod error;
mod graph;
mod mot;
mod mtt;
pub mod path;
mod reduce;

pub use error::{TreeError, TreeResult};
pub use graph::{Arborescence, NodeId};
pub use mot::{MessageObjectTree, MotNode};
pub use mtt::{MessageTypeTree, MttCache, MttNode};
pub use path::Relation;
