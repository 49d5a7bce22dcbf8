//! Schema descriptors: the opaque type-description service the trees are
//! built against.

use crate::types::TypeRef;
use serde::{Deserialize, Serialize};

/// A field of a message type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub type_ref: TypeRef,

    /// Name of the mutually-exclusive group this field belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oneof: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            oneof: None,
        }
    }

    pub fn in_oneof(mut self, group: impl Into<String>) -> Self {
        self.oneof = Some(group.into());
        self
    }

    /// Fields starting with `_` are internal bookkeeping, not schema
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// A message type, fields in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_ref));
        self
    }

    pub fn oneof_field(mut self, group: impl Into<String>, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_ref).in_oneof(group));
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, name: impl Into<String>, number: i32) -> Self {
        self.variants.push(EnumVariant {
            name: name.into(),
            number,
        });
        self
    }

    pub fn variant_name(&self, number: i32) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.number == number)
            .map(|v| v.name.as_str())
    }

    pub fn variant_number(&self, name: &str) -> Option<i32> {
        self.variants.iter().find(|v| v.name == name).map(|v| v.number)
    }

    /// The zero value of a proto enum, falling back to the first variant
    pub fn default_number(&self) -> i32 {
        if self.variants.iter().any(|v| v.number == 0) {
            0
        } else {
            self.variants.first().map(|v| v.number).unwrap_or(0)
        }
    }
}

/// On-disk schema file layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,

    #[serde(default)]
    pub enums: Vec<EnumDescriptor>,
}
