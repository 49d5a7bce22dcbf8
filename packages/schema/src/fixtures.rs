//! Shared test schema: a cut-down reaction record.
//!
//! Enabled with the `test-fixtures` feature so the other crates' tests can
//! build trees against the same types.

use crate::descriptor::{EnumDescriptor, MessageDescriptor};
use crate::registry::TypeRegistry;
use crate::types::TypeRef;
use crate::value::{Message, Value};
use std::collections::BTreeMap;

pub const REACTION: &str = "ord.Reaction";
pub const COMPOUND: &str = "ord.Compound";
pub const AMOUNT: &str = "ord.Amount";
pub const WORKUP: &str = "ord.ReactionWorkup";
pub const WORKUP_TYPE: &str = "ord.WorkupType";
pub const TAGGED: &str = "ord.Tagged";
pub const TAG: &str = "ord.Tag";

/// Registry with every fixture type
pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    let enums = [EnumDescriptor::new(WORKUP_TYPE)
        .variant("UNSPECIFIED", 0)
        .variant("ADDITION", 1)
        .variant("EXTRACTION", 6)];
    let messages = [
        MessageDescriptor::new(AMOUNT)
            .field("value", TypeRef::FLOAT)
            .field("units", TypeRef::STRING),
        MessageDescriptor::new(COMPOUND)
            .field("name", TypeRef::STRING)
            .field("amount", TypeRef::named(AMOUNT))
            .field("smiles", TypeRef::optional(TypeRef::STRING)),
        MessageDescriptor::new(WORKUP)
            .field("type", TypeRef::named(WORKUP_TYPE))
            .field("details", TypeRef::STRING)
            .field("keep_phase", TypeRef::BOOL)
            .field("duration", TypeRef::optional(TypeRef::FLOAT)),
        MessageDescriptor::new(REACTION)
            .field("identifiers", TypeRef::list(TypeRef::STRING))
            .field("inputs", TypeRef::map(TypeRef::named(COMPOUND)))
            .field("workups", TypeRef::list(TypeRef::named(WORKUP)))
            .field("notes", TypeRef::map(TypeRef::STRING))
            .field("raw", TypeRef::BYTES)
            .field("yield", TypeRef::optional(TypeRef::FLOAT))
            .field("is_automated", TypeRef::BOOL)
            .field("_unknown_fields", TypeRef::BYTES),
        MessageDescriptor::new(TAG).field("label", TypeRef::STRING),
        MessageDescriptor::new(TAGGED)
            .field("name", TypeRef::STRING)
            .field("tags", TypeRef::list(TypeRef::named(TAG)))
            .oneof_field("kind", "a", TypeRef::INT)
            .oneof_field("kind", "b", TypeRef::STRING),
    ];

    for e in enums {
        registry.register_enum(e).expect("fixture enum");
    }
    for m in messages {
        registry.register_message(m).expect("fixture message");
    }
    registry
}

/// A populated reaction touching every field kind
pub fn sample_reaction() -> Message {
    let water = Message::new(COMPOUND)
        .with("name", Value::string("water"))
        .with(
            "amount",
            Message::new(AMOUNT)
                .with("value", Value::float(10.0))
                .with("units", Value::string("mL")),
        );
    let salt = Message::new(COMPOUND)
        .with("name", Value::string("salt"))
        .with("smiles", Value::string("[Na+].[Cl-]"));

    let mut inputs = BTreeMap::new();
    inputs.insert("solvent".to_string(), Value::Message(water));
    inputs.insert("additive".to_string(), Value::Message(salt));

    let mut notes = BTreeMap::new();
    notes.insert("lab".to_string(), Value::string("B12"));

    Message::new(REACTION)
        .with("identifiers", Value::List(vec![Value::string("rxn-1"), Value::string("alt")]))
        .with("inputs", Value::Map(inputs))
        .with(
            "workups",
            Value::List(vec![
                Value::Message(
                    Message::new(WORKUP)
                        .with("type", Value::enum_number(1))
                        .with("details", Value::string("add water")),
                ),
                Value::Message(
                    Message::new(WORKUP)
                        .with("type", Value::enum_number(6))
                        .with("keep_phase", Value::bool(true))
                        .with("duration", Value::float(1.5)),
                ),
            ]),
        )
        .with("notes", Value::Map(notes))
        .with("raw", Value::bytes(vec![0, 159, 146, 150]))
        .with("yield", Value::float(87.5))
}
