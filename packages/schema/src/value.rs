//! Dynamic message values.
//!
//! A [`Message`] is sparse: it only stores the fields that were set, and
//! unset fields read as their schema default through the registry.

use crate::error::{SchemaError, SchemaResult};
use crate::types::{LiteralType, NodeClass};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A leaf value: builtin scalar or enum number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Int(i64),
    #[serde(with = "float_json")]
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Enum(i32),
}

impl Literal {
    pub fn default_for(lit: LiteralType) -> Self {
        match lit {
            LiteralType::String => Literal::String(String::new()),
            LiteralType::Int => Literal::Int(0),
            LiteralType::Float => Literal::Float(0.0),
            LiteralType::Bool => Literal::Bool(false),
            LiteralType::Bytes => Literal::Bytes(Vec::new()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Bool(_) => "bool",
            Literal::Bytes(_) => "bytes",
            Literal::Enum(_) => "enum",
        }
    }

    /// Whether this literal can sit in a node of the given class
    pub fn fits(&self, class: &NodeClass) -> bool {
        matches!(
            (self, class),
            (Literal::String(_), NodeClass::Literal(LiteralType::String))
                | (Literal::Int(_), NodeClass::Literal(LiteralType::Int))
                | (Literal::Float(_), NodeClass::Literal(LiteralType::Float))
                | (Literal::Bool(_), NodeClass::Literal(LiteralType::Bool))
                | (Literal::Bytes(_), NodeClass::Literal(LiteralType::Bytes))
                | (Literal::Enum(_), NodeClass::Enum(_))
        )
    }

    /// Raw JSON form: bytes as base64, enums by number, non-finite floats
    /// as `"NaN"`, `"Infinity"` or `"-Infinity"`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Literal::String(s) => serde_json::Value::String(s.clone()),
            Literal::Int(i) => serde_json::Value::from(*i),
            Literal::Float(f) => float_to_json(*f),
            Literal::Bool(b) => serde_json::Value::Bool(*b),
            Literal::Bytes(b) => serde_json::Value::String(BASE64.encode(b)),
            Literal::Enum(n) => serde_json::Value::from(*n),
        }
    }

    /// Inverse of [`Literal::to_json`], guided by the node class.
    ///
    /// Malformed base64 is an error, never a string fallback.
    pub fn from_json(class: &NodeClass, json: &serde_json::Value) -> SchemaResult<Self> {
        let mismatch = || SchemaError::mismatch(class, json.to_string());

        match class {
            NodeClass::Literal(LiteralType::String) => {
                json.as_str().map(|s| Literal::String(s.to_string())).ok_or_else(mismatch)
            }
            NodeClass::Literal(LiteralType::Int) => json.as_i64().map(Literal::Int).ok_or_else(mismatch),
            NodeClass::Literal(LiteralType::Float) => float_from_json(json).map(Literal::Float).ok_or_else(mismatch),
            NodeClass::Literal(LiteralType::Bool) => json.as_bool().map(Literal::Bool).ok_or_else(mismatch),
            NodeClass::Literal(LiteralType::Bytes) => {
                let encoded = json.as_str().ok_or_else(mismatch)?;
                BASE64
                    .decode(encoded)
                    .map(Literal::Bytes)
                    .map_err(|e| SchemaError::CorruptBinary(e.to_string()))
            }
            NodeClass::Enum(_) => json
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Literal::Enum)
                .ok_or_else(mismatch),
            NodeClass::Message(_) | NodeClass::List | NodeClass::Map => Err(mismatch()),
        }
    }
}

fn float_to_json(f: f64) -> serde_json::Value {
    if f.is_nan() {
        serde_json::Value::from("NaN")
    } else if f.is_infinite() {
        serde_json::Value::from(if f > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serde_json::Value::from(f)
    }
}

fn float_from_json(json: &serde_json::Value) -> Option<f64> {
    match json {
        serde_json::Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        other => other.as_f64(),
    }
}

/// Serde form of `Literal::Float`, sharing the raw JSON spelling
mod float_json {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        super::float_to_json(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        super::float_from_json(&json).ok_or_else(|| D::Error::custom(format!("expected a float, got {}", json)))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Bytes(b) => write!(f, "b64:{}", BASE64.encode(b)),
            Literal::Enum(n) => write!(f, "#{}", n),
        }
    }
}

/// Any value a field can hold
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    Message(Message),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Literal(Literal::String(s.into()))
    }

    pub fn int(i: i64) -> Self {
        Value::Literal(Literal::Int(i))
    }

    pub fn float(f: f64) -> Self {
        Value::Literal(Literal::Float(f))
    }

    pub fn bool(b: bool) -> Self {
        Value::Literal(Literal::Bool(b))
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Literal(Literal::Bytes(b.into()))
    }

    pub fn enum_number(n: i32) -> Self {
        Value::Literal(Literal::Enum(n))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            Value::Literal(lit) => lit.type_name(),
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

impl From<Message> for Value {
    fn from(m: Message) -> Self {
        Value::Message(m)
    }
}

/// Instance of a message type
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl Message {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Builder-style set, no schema checks
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Raw set, no schema checks. See `TypeRegistry::set_field` for the
    /// oneof-aware version.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn clear(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn set_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_literal_json() {
        let lit = Literal::Bytes(vec![0, 159, 146, 150]);
        let json = lit.to_json();
        assert_eq!(json, serde_json::json!("AJ+Slg=="));

        let back = Literal::from_json(&NodeClass::Literal(LiteralType::Bytes), &json).unwrap();
        assert_eq!(back, lit);
    }

    #[test]
    fn test_corrupt_bytes_literal_is_error() {
        let result = Literal::from_json(
            &NodeClass::Literal(LiteralType::Bytes),
            &serde_json::json!("not base64 !!"),
        );
        assert!(matches!(result, Err(SchemaError::CorruptBinary(_))));
    }

    #[test]
    fn test_non_finite_float_json() {
        let class = NodeClass::Literal(LiteralType::Float);
        assert_eq!(Literal::Float(f64::NAN).to_json(), serde_json::json!("NaN"));
        assert_eq!(Literal::Float(f64::NEG_INFINITY).to_json(), serde_json::json!("-Infinity"));

        let back = Literal::from_json(&class, &serde_json::json!("NaN")).unwrap();
        assert!(matches!(back, Literal::Float(f) if f.is_nan()));
        let back = Literal::from_json(&class, &serde_json::json!("Infinity")).unwrap();
        assert_eq!(back, Literal::Float(f64::INFINITY));
        assert!(Literal::from_json(&class, &serde_json::json!("nan")).is_err());
        assert!(Literal::from_json(&class, &serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_float_literal_serde_keeps_infinity() {
        let text = serde_json::to_string(&Literal::Float(f64::INFINITY)).unwrap();
        assert_eq!(text, r#"{"kind":"float","value":"Infinity"}"#);
        let back: Literal = serde_json::from_str(&text).unwrap();
        assert_eq!(back, Literal::Float(f64::INFINITY));
        let plain: Literal = serde_json::from_str(r#"{"kind":"float","value":1.5}"#).unwrap();
        assert_eq!(plain, Literal::Float(1.5));
    }

    #[test]
    fn test_literal_fits_class() {
        assert!(Literal::Int(1).fits(&NodeClass::Literal(LiteralType::Int)));
        assert!(!Literal::Int(1).fits(&NodeClass::Literal(LiteralType::Float)));
        assert!(Literal::Enum(2).fits(&NodeClass::Enum("ord.Kind".into())));
        assert!(!Literal::String("x".into()).fits(&NodeClass::List));
    }

    #[test]
    fn test_message_sparse_fields() {
        let mut m = Message::new("ord.Tag").with("label", Value::string("a"));
        assert!(m.is_set("label"));
        assert!(!m.is_set("other"));
        m.clear("label");
        assert!(m.is_empty());
    }
}
