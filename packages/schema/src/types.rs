//! Type references as they appear in a schema, and the concrete class a tree
//! node is materialized as.
//!
//! The textual form is the one used in schema files and in serialized trees:
//!
//! ```text
//! string | int | float | bool | bytes      literal
//! pkg.Name                                  enum or message (resolved by the registry)
//! List<T> | Map<string,T> | Optional<T>     containers
//! ```

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Builtin scalar classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LiteralType {
    String,
    Int,
    Float,
    Bool,
    Bytes,
}

impl LiteralType {
    pub const ALL: [LiteralType; 5] = [
        LiteralType::String,
        LiteralType::Int,
        LiteralType::Float,
        LiteralType::Bool,
        LiteralType::Bytes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LiteralType::String => "string",
            LiteralType::Int => "int",
            LiteralType::Float => "float",
            LiteralType::Bool => "bool",
            LiteralType::Bytes => "bytes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "str" => Some(LiteralType::String),
            "int" => Some(LiteralType::Int),
            "float" => Some(LiteralType::Float),
            "bool" => Some(LiteralType::Bool),
            "bytes" => Some(LiteralType::Bytes),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field's declared type.
///
/// Any nesting is representable here; `classify` decides which shapes are
/// legal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Literal(LiteralType),
    /// Enum or message, by fully-qualified dotted name
    Named(String),
    List(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Optional(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    /// `Map<string, value>`
    pub fn map(value: TypeRef) -> Self {
        TypeRef::Map(Box::new(TypeRef::Literal(LiteralType::String)), Box::new(value))
    }

    pub fn optional(inner: TypeRef) -> Self {
        TypeRef::Optional(Box::new(inner))
    }

    pub const STRING: TypeRef = TypeRef::Literal(LiteralType::String);
    pub const INT: TypeRef = TypeRef::Literal(LiteralType::Int);
    pub const FLOAT: TypeRef = TypeRef::Literal(LiteralType::Float);
    pub const BOOL: TypeRef = TypeRef::Literal(LiteralType::Bool);
    pub const BYTES: TypeRef = TypeRef::Literal(LiteralType::Bytes);
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Literal(lit) => write!(f, "{}", lit),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "List<{}>", inner),
            TypeRef::Map(key, value) => write!(f, "Map<{},{}>", key, value),
            TypeRef::Optional(inner) => write!(f, "Optional<{}>", inner),
        }
    }
}

impl FromStr for TypeRef {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        parse_type_ref(s.trim(), s)
    }
}

fn parse_type_ref(s: &str, input: &str) -> SchemaResult<TypeRef> {
    let syntax = |message: &str| SchemaError::InvalidTypeSyntax {
        input: input.to_string(),
        message: message.to_string(),
    };

    if let Some(open) = s.find('<') {
        if !s.ends_with('>') {
            return Err(syntax("unterminated type arguments"));
        }
        let head = s[..open].trim();
        let args = split_type_args(&s[open + 1..s.len() - 1]).ok_or_else(|| syntax("unbalanced brackets"))?;

        return match (head, args.as_slice()) {
            ("List", [element]) => Ok(TypeRef::list(parse_type_ref(element, input)?)),
            ("Optional", [inner]) => Ok(TypeRef::optional(parse_type_ref(inner, input)?)),
            ("Map", [key, value]) => Ok(TypeRef::Map(
                Box::new(parse_type_ref(key, input)?),
                Box::new(parse_type_ref(value, input)?),
            )),
            ("List" | "Optional" | "Map", _) => Err(syntax("wrong number of type arguments")),
            _ => Err(syntax("unknown container")),
        };
    }

    if let Some(lit) = LiteralType::from_name(s) {
        return Ok(TypeRef::Literal(lit));
    }

    let valid_name = !s.is_empty()
        && !s.starts_with('.')
        && !s.ends_with('.')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && s.chars().next().map(|c| !c.is_ascii_digit()).unwrap_or(false);

    if valid_name {
        Ok(TypeRef::Named(s.to_string()))
    } else {
        Err(syntax("not a type name"))
    }
}

/// Split `A, Map<B, C>` on top-level commas
fn split_type_args(s: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(s[start..].trim());
    Some(parts)
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The concrete class a tree node stands for.
///
/// Containers carry no element type here; the element type lives on the
/// node's single schema child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeClass {
    Literal(LiteralType),
    Enum(String),
    Message(String),
    List,
    Map,
}

impl NodeClass {
    pub fn is_literal_like(&self) -> bool {
        matches!(self, NodeClass::Literal(_) | NodeClass::Enum(_))
    }

    pub fn message_name(&self) -> Option<&str> {
        match self {
            NodeClass::Message(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeClass::Literal(lit) => write!(f, "{}", lit),
            NodeClass::Enum(name) | NodeClass::Message(name) => f.write_str(name),
            NodeClass::List => f.write_str("list"),
            NodeClass::Map => f.write_str("map"),
        }
    }
}

impl Serialize for NodeClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
