//! Message JSON in the proto3 style: default-valued fields are omitted, enums
//! are written by variant name and bytes as base64.

use crate::error::{SchemaError, SchemaResult};
use crate::introspect::FieldKind;
use crate::registry::{ResolvedType, TypeRegistry};
use crate::types::{LiteralType, NodeClass, TypeRef};
use crate::value::{Literal, Message, Value};
use serde_json::{Map as JsonMap, Value as Json};
use std::collections::BTreeMap;

impl TypeRegistry {
    pub fn message_to_json(&self, message: &Message) -> SchemaResult<Json> {
        let mut object = JsonMap::new();
        for field in self.fields_of(message.type_name())? {
            let Some(value) = message.get(&field.name) else {
                continue;
            };
            let kind = self.classify(&field.type_ref)?;
            // set optionals and oneof members carry presence, so they are kept
            if kind != FieldKind::OptionalLiteral && field.oneof.is_none() && self.is_default(value, kind) {
                continue;
            }
            object.insert(field.name.clone(), self.value_to_json(&field.type_ref, value)?);
        }
        Ok(Json::Object(object))
    }

    pub fn value_to_json(&self, type_ref: &TypeRef, value: &Value) -> SchemaResult<Json> {
        let mismatch = || SchemaError::mismatch(type_ref, value.shape_name());

        match (type_ref, value) {
            (TypeRef::Optional(inner), _) => self.value_to_json(inner, value),
            (TypeRef::List(element), Value::List(items)) => items
                .iter()
                .map(|item| self.value_to_json(element, item))
                .collect::<SchemaResult<Vec<_>>>()
                .map(Json::Array),
            (TypeRef::Map(_, value_type), Value::Map(entries)) => {
                let mut object = JsonMap::new();
                for (key, entry) in entries {
                    object.insert(key.clone(), self.value_to_json(value_type, entry)?);
                }
                Ok(Json::Object(object))
            }
            (TypeRef::Literal(_), Value::Literal(lit)) => Ok(lit.to_json()),
            (TypeRef::Named(name), _) => match (self.resolve(name)?, value) {
                (ResolvedType::Message(_), Value::Message(message)) => self.message_to_json(message),
                (ResolvedType::Enum(descriptor), Value::Literal(Literal::Enum(number))) => Ok(descriptor
                    .variant_name(*number)
                    .map(|n| Json::String(n.to_string()))
                    .unwrap_or_else(|| Json::from(*number))),
                (ResolvedType::Literal(_), Value::Literal(lit)) => Ok(lit.to_json()),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        }
    }

    pub fn message_from_json(&self, message_type: &str, json: &Json) -> SchemaResult<Message> {
        let object = json
            .as_object()
            .ok_or_else(|| SchemaError::mismatch(message_type, json.to_string()))?;

        let mut message = Message::new(self.message(message_type)?.name.clone());
        for (name, field_json) in object {
            let field = self.field_of(message_type, name)?;
            if field_json.is_null() {
                continue;
            }
            let value = self.value_from_json(&field.type_ref, field_json)?;
            self.set_field(&mut message, name, value)?;
        }
        Ok(message)
    }

    pub fn value_from_json(&self, type_ref: &TypeRef, json: &Json) -> SchemaResult<Value> {
        let mismatch = || SchemaError::mismatch(type_ref, json.to_string());

        match type_ref {
            TypeRef::Optional(inner) => self.value_from_json(inner, json),
            TypeRef::List(element) => json
                .as_array()
                .ok_or_else(mismatch)?
                .iter()
                .map(|item| self.value_from_json(element, item))
                .collect::<SchemaResult<Vec<_>>>()
                .map(Value::List),
            TypeRef::Map(_, value_type) => {
                let mut entries = BTreeMap::new();
                for (key, entry) in json.as_object().ok_or_else(mismatch)? {
                    entries.insert(key.clone(), self.value_from_json(value_type, entry)?);
                }
                Ok(Value::Map(entries))
            }
            TypeRef::Literal(lit) => literal_from_json(*lit, json).map(Value::Literal),
            TypeRef::Named(name) => match self.resolve(name)? {
                ResolvedType::Message(m) => self.message_from_json(&m.name, json).map(Value::Message),
                ResolvedType::Enum(descriptor) => {
                    let number = match json {
                        Json::String(variant) => {
                            descriptor
                                .variant_number(variant)
                                .ok_or_else(|| SchemaError::UnknownEnumVariant {
                                    enum_name: descriptor.name.clone(),
                                    variant: variant.clone(),
                                })?
                        }
                        _ => json.as_i64().and_then(|n| i32::try_from(n).ok()).ok_or_else(mismatch)?,
                    };
                    Ok(Value::enum_number(number))
                }
                ResolvedType::Literal(lit) => literal_from_json(lit, json).map(Value::Literal),
            },
        }
    }
}

/// int64 values may arrive as strings, as proto3 JSON writes them
fn literal_from_json(lit: LiteralType, json: &Json) -> SchemaResult<Literal> {
    if let (LiteralType::Int, Json::String(s)) = (lit, json) {
        return s
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| SchemaError::mismatch(lit, json.to_string()));
    }
    Literal::from_json(&NodeClass::Literal(lit), json)
}
