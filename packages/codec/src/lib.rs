//! # ordtree-codec
//!
//! Portable node-link form for every tree in the workspace, and the
//! persisted prototype documents built on it.
//!
//! ```text
//! MessageTypeTree ──encode_mtt──►  ┌───────────────┐
//! MessageObjectTree ─encode_mot──► │ NodeLinkGraph │ ──► JSON
//! PrototypeTree ──encode_prototype►└───────────────┘
//!                                          │
//!                             decode_* (TypeRegistry resolves classes)
//!
//! PrototypeDocument { id, name, version, from_version, node_link_data, ... }
//!        │
//!        └── DocumentStore (FileDocumentStore / MemoryDocumentStore)
//! ```

mod codec;
mod document;
mod error;
mod node_link;
mod store;

pub use codec::{
    decode_mot, decode_mtt, decode_prototype, encode_mot, encode_mtt, encode_prototype, MotGraph, MotLinkRecord,
    MotNodeRecord, MttGraph, MttLinkRecord, MttNodeRecord, PrototypeGraph, PrototypeLinkRecord, PrototypeNodeRecord,
};
pub use document::PrototypeDocument;
pub use error::{CodecError, CodecResult};
pub use node_link::{GraphAttributes, LinkEntry, NodeEntry, NodeLinkGraph, TreeKind};
pub use store::{DocumentStore, FileDocumentStore, MemoryDocumentStore, StoreSource};
