//! # Type Registry
//!
//! Read-only lookup of every message and enum type the trees may encounter.
//! It is built once (from a schema file or programmatically) and then passed
//! by reference to everything that needs type resolution.

use crate::descriptor::{EnumDescriptor, MessageDescriptor, SchemaFile};
use crate::error::{SchemaError, SchemaResult};
use crate::types::{LiteralType, NodeClass};
use std::collections::HashMap;
use std::path::Path;

/// A type name resolved against the registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedType<'a> {
    Literal(LiteralType),
    Enum(&'a EnumDescriptor),
    Message(&'a MessageDescriptor),
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    messages: HashMap<String, MessageDescriptor>,
    enums: HashMap<String, EnumDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_message(&mut self, descriptor: MessageDescriptor) -> SchemaResult<()> {
        self.ensure_free(&descriptor.name)?;
        self.messages.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn register_enum(&mut self, descriptor: EnumDescriptor) -> SchemaResult<()> {
        self.ensure_free(&descriptor.name)?;
        self.enums.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    fn ensure_free(&self, name: &str) -> SchemaResult<()> {
        if LiteralType::from_name(name).is_some()
            || self.messages.contains_key(name)
            || self.enums.contains_key(name)
        {
            return Err(SchemaError::DuplicateType(name.to_string()));
        }
        Ok(())
    }

    /// Build a registry from a parsed schema file and check every field
    /// type can be classified.
    pub fn from_schema(schema: SchemaFile) -> SchemaResult<Self> {
        let mut registry = Self::new();
        for e in schema.enums {
            registry.register_enum(e)?;
        }
        for m in schema.messages {
            registry.register_message(m)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_json_str(source: &str) -> SchemaResult<Self> {
        let schema: SchemaFile = serde_json::from_str(source)?;
        Self::from_schema(schema)
    }

    pub fn load(path: &Path) -> SchemaResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Json(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&source)
    }

    /// Every field of every message classifies
    pub fn validate(&self) -> SchemaResult<()> {
        for name in self.message_names() {
            for field in self.fields_of(name)? {
                self.classify(&field.type_ref)?;
            }
        }
        Ok(())
    }

    /// `resolve(type_name) → TypeRef` of the external interface
    pub fn resolve(&self, name: &str) -> SchemaResult<ResolvedType<'_>> {
        if let Some(lit) = LiteralType::from_name(name) {
            return Ok(ResolvedType::Literal(lit));
        }
        if let Some(m) = self.messages.get(name) {
            return Ok(ResolvedType::Message(m));
        }
        if let Some(e) = self.enums.get(name) {
            return Ok(ResolvedType::Enum(e));
        }
        Err(SchemaError::UnresolvedTypeReference(name.to_string()))
    }

    /// Re-resolve the textual form of a [`NodeClass`]
    pub fn resolve_class(&self, name: &str) -> SchemaResult<NodeClass> {
        match name {
            "list" => Ok(NodeClass::List),
            "map" => Ok(NodeClass::Map),
            _ => Ok(match self.resolve(name)? {
                ResolvedType::Literal(lit) => NodeClass::Literal(lit),
                ResolvedType::Enum(e) => NodeClass::Enum(e.name.clone()),
                ResolvedType::Message(m) => NodeClass::Message(m.name.clone()),
            }),
        }
    }

    pub fn message(&self, name: &str) -> SchemaResult<&MessageDescriptor> {
        self.messages
            .get(name)
            .ok_or_else(|| SchemaError::UnresolvedTypeReference(name.to_string()))
    }

    pub fn enumeration(&self, name: &str) -> SchemaResult<&EnumDescriptor> {
        self.enums
            .get(name)
            .ok_or_else(|| SchemaError::UnresolvedTypeReference(name.to_string()))
    }

    pub fn is_message(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    /// Sorted, for deterministic iteration
    pub fn message_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn enum_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.enums.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
