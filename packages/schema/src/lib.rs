//! # ordtree schema
//!
//! The type side of ordtree: how message types are described, how a field's
//! declared type is classified, and the dynamic values the trees are built
//! from and folded back into.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ SchemaFile (JSON) / programmatic descriptors│
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ TypeRegistry                                │
//! │  - resolve(name) → literal | enum | message │
//! │  - classify(TypeRef) → FieldKind            │
//! │  - fields_of / oneof_group_of               │
//! │  - is_default, message JSON                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ordtree-tree: MTT / MOT                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ordtree_schema::{TypeRegistry, TypeRef};
//!
//! let registry = TypeRegistry::load(Path::new("schema.json"))?;
//! let kind = registry.classify(&"List<ord.Compound>".parse::<TypeRef>()?)?;
//! let message = registry.message_from_json("ord.Reaction", &json)?;
//! ```

mod descriptor;
mod error;
mod introspect;
mod json;
mod registry;
mod types;
mod value;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

pub use descriptor::{EnumDescriptor, EnumVariant, FieldDescriptor, MessageDescriptor, SchemaFile};
pub use error::{SchemaError, SchemaResult};
pub use introspect::FieldKind;
pub use registry::{ResolvedType, TypeRegistry};
pub use types::{LiteralType, NodeClass, TypeRef};
pub use value::{Literal, Message, Value};
