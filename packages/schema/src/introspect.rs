//! # Type Introspection
//!
//! Classification of field types into a closed set of [`FieldKind`]s, plus
//! the per-kind default predicate used by tree compaction.
//!
//! ```text
//! string            -> Literal
//! pkg.SomeEnum      -> Enum
//! pkg.SomeMessage   -> Message
//! List<lit|msg>     -> ListOfLiteral | ListOfMessage
//! Map<string,T>     -> MapOfLiteral  | MapOfMessage
//! Optional<lit>     -> OptionalLiteral
//! ```
//!
//! Containers are flat: a container argument is never itself a container.

use crate::descriptor::FieldDescriptor;
use crate::error::{SchemaError, SchemaResult};
use crate::registry::{ResolvedType, TypeRegistry};
use crate::types::{LiteralType, NodeClass, TypeRef};
use crate::value::{Literal, Message, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Literal,
    Enum,
    Message,
    ListOfLiteral,
    ListOfMessage,
    MapOfLiteral,
    MapOfMessage,
    OptionalLiteral,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Literal,
        FieldKind::Enum,
        FieldKind::Message,
        FieldKind::ListOfLiteral,
        FieldKind::ListOfMessage,
        FieldKind::MapOfLiteral,
        FieldKind::MapOfMessage,
        FieldKind::OptionalLiteral,
    ];

    /// Leaf kinds: a node of this kind carries a value and never has children
    pub fn is_literal_like(&self) -> bool {
        matches!(self, FieldKind::Literal | FieldKind::OptionalLiteral | FieldKind::Enum)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldKind::ListOfLiteral | FieldKind::ListOfMessage)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, FieldKind::MapOfLiteral | FieldKind::MapOfMessage)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Literal => "Literal",
            FieldKind::Enum => "Enum",
            FieldKind::Message => "Message",
            FieldKind::ListOfLiteral => "ListOfLiteral",
            FieldKind::ListOfMessage => "ListOfMessage",
            FieldKind::MapOfLiteral => "MapOfLiteral",
            FieldKind::MapOfMessage => "MapOfMessage",
            FieldKind::OptionalLiteral => "OptionalLiteral",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        FieldKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| SchemaError::unrecognized(s, "not a field kind"))
    }
}

impl TypeRegistry {
    /// Classify a type reference, rejecting every shape outside the closed set
    pub fn classify(&self, type_ref: &TypeRef) -> SchemaResult<FieldKind> {
        match type_ref {
            TypeRef::Literal(_) => Ok(FieldKind::Literal),
            TypeRef::Named(name) => match self.resolve(name) {
                Ok(ResolvedType::Enum(_)) => Ok(FieldKind::Enum),
                Ok(ResolvedType::Message(_)) => Ok(FieldKind::Message),
                Ok(ResolvedType::Literal(_)) => Ok(FieldKind::Literal),
                Err(_) => Err(SchemaError::unrecognized(type_ref, "not a registered enum or message")),
            },
            TypeRef::List(element) => match self.classify_argument(type_ref, element)? {
                FieldKind::Literal => Ok(FieldKind::ListOfLiteral),
                FieldKind::Message => Ok(FieldKind::ListOfMessage),
                _ => Err(SchemaError::unrecognized(type_ref, "list elements must be literals or messages")),
            },
            TypeRef::Map(key, value) => {
                if **key != TypeRef::Literal(LiteralType::String) {
                    return Err(SchemaError::unrecognized(type_ref, "map keys must be strings"));
                }
                match self.classify_argument(type_ref, value)? {
                    FieldKind::Literal | FieldKind::Enum => Ok(FieldKind::MapOfLiteral),
                    FieldKind::Message => Ok(FieldKind::MapOfMessage),
                    _ => Err(SchemaError::unrecognized(type_ref, "unsupported map value")),
                }
            }
            TypeRef::Optional(inner) => match self.classify_argument(type_ref, inner)? {
                FieldKind::Literal => Ok(FieldKind::OptionalLiteral),
                _ => Err(SchemaError::unrecognized(type_ref, "only literals can be optional")),
            },
        }
    }

    fn classify_argument(&self, outer: &TypeRef, argument: &TypeRef) -> SchemaResult<FieldKind> {
        if matches!(argument, TypeRef::List(_) | TypeRef::Map(..) | TypeRef::Optional(_)) {
            return Err(SchemaError::unrecognized(outer, "nested containers are not supported"));
        }
        self.classify(argument)
    }

    /// Public fields of a message type in declaration order
    pub fn fields_of(&self, message_type: &str) -> SchemaResult<Vec<&FieldDescriptor>> {
        let descriptor = self.message(message_type)?;
        Ok(descriptor.fields.iter().filter(|f| !f.is_private()).collect())
    }

    pub fn field_of(&self, message_type: &str, field: &str) -> SchemaResult<&FieldDescriptor> {
        self.message(message_type)?
            .get_field(field)
            .filter(|f| !f.is_private())
            .ok_or_else(|| SchemaError::UnknownField {
                message: message_type.to_string(),
                field: field.to_string(),
            })
    }

    pub fn oneof_group_of(&self, message_type: &str, field: &str) -> SchemaResult<Option<&str>> {
        Ok(self.field_of(message_type, field)?.oneof.as_deref())
    }

    /// Concrete class a node of this type materializes as.
    ///
    /// `Optional<T>` unwraps to `T`.
    pub fn node_class_of(&self, type_ref: &TypeRef) -> SchemaResult<NodeClass> {
        match type_ref {
            TypeRef::Literal(lit) => Ok(NodeClass::Literal(*lit)),
            TypeRef::Named(name) => self.resolve_class(name),
            TypeRef::List(_) => Ok(NodeClass::List),
            TypeRef::Map(..) => Ok(NodeClass::Map),
            TypeRef::Optional(inner) => self.node_class_of(inner),
        }
    }

    /// Type of the uniform child of a container: list element or map value
    pub fn element_type_of(type_ref: &TypeRef) -> Option<&TypeRef> {
        match type_ref {
            TypeRef::List(element) => Some(element),
            TypeRef::Map(_, value) => Some(value),
            _ => None,
        }
    }

    /// Schema default of a field type; `None` for an unset optional
    pub fn default_value(&self, type_ref: &TypeRef) -> SchemaResult<Option<Value>> {
        Ok(match type_ref {
            TypeRef::Literal(lit) => Some(Value::Literal(Literal::default_for(*lit))),
            TypeRef::Named(name) => match self.resolve(name)? {
                ResolvedType::Literal(lit) => Some(Value::Literal(Literal::default_for(lit))),
                ResolvedType::Enum(e) => Some(Value::enum_number(e.default_number())),
                ResolvedType::Message(m) => Some(Value::Message(Message::new(m.name.clone()))),
            },
            TypeRef::List(_) => Some(Value::List(Vec::new())),
            TypeRef::Map(..) => Some(Value::Map(Default::default())),
            TypeRef::Optional(_) => None,
        })
    }

    /// Effective value of a field: the explicit value, or the schema default
    pub fn field_value(&self, message: &Message, field: &str) -> SchemaResult<Option<Value>> {
        let descriptor = self.field_of(message.type_name(), field)?;
        match message.get(field) {
            Some(value) => Ok(Some(value.clone())),
            None => self.default_value(&descriptor.type_ref),
        }
    }

    /// Whether `value` equals the schema default for a field of `kind`.
    ///
    /// A present optional is never default. Messages are default when every
    /// set field is default for its own kind.
    pub fn is_default(&self, value: &Value, kind: FieldKind) -> bool {
        match (kind, value) {
            (FieldKind::OptionalLiteral, _) => false,
            (FieldKind::Literal, Value::Literal(lit)) => match lit {
                Literal::String(s) => s.is_empty(),
                Literal::Int(i) => *i == 0,
                Literal::Float(f) => *f == 0.0,
                Literal::Bool(b) => !*b,
                Literal::Bytes(b) => b.is_empty(),
                Literal::Enum(n) => *n == 0,
            },
            (FieldKind::Enum, Value::Literal(Literal::Enum(n))) => *n == 0,
            (FieldKind::Message, Value::Message(message)) => self.is_default_message(message),
            (FieldKind::ListOfLiteral | FieldKind::ListOfMessage, Value::List(items)) => items.is_empty(),
            (FieldKind::MapOfLiteral | FieldKind::MapOfMessage, Value::Map(entries)) => entries.is_empty(),
            _ => false,
        }
    }

    pub fn is_default_message(&self, message: &Message) -> bool {
        message.set_fields().all(|(name, value)| {
            match self.field_of(message.type_name(), name) {
                Ok(field) => match self.classify(&field.type_ref) {
                    Ok(kind) => field.oneof.is_none() && self.is_default(value, kind),
                    Err(_) => false,
                },
                // private bookkeeping fields do not count
                Err(_) => name.starts_with('_'),
            }
        })
    }

    /// Set a field on a message, checking it exists and clearing the other
    /// members of its oneof group.
    pub fn set_field(&self, message: &mut Message, field: &str, value: impl Into<Value>) -> SchemaResult<()> {
        let descriptor = self.message(message.type_name())?;
        let target = descriptor
            .get_field(field)
            .ok_or_else(|| SchemaError::UnknownField {
                message: message.type_name().to_string(),
                field: field.to_string(),
            })?;

        if let Some(group) = &target.oneof {
            let siblings: Vec<String> = descriptor
                .fields
                .iter()
                .filter(|f| f.oneof.as_ref() == Some(group) && f.name != field)
                .map(|f| f.name.clone())
                .collect();
            for sibling in siblings {
                message.clear(&sibling);
            }
        }

        message.set(field, value);
        Ok(())
    }
}
