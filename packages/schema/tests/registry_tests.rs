use ordtree_schema::fixtures::{self, REACTION, TAGGED, WORKUP_TYPE};
use ordtree_schema::{FieldKind, SchemaError, TypeRef, TypeRegistry, Value};
use serde_json::json;
use std::io::Write;

#[test]
fn test_load_schema_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "enums": [
                {{ "name": "lab.Phase", "variants": [ {{ "name": "UNKNOWN", "number": 0 }}, {{ "name": "SOLID", "number": 1 }} ] }}
            ],
            "messages": [
                {{ "name": "lab.Sample", "fields": [
                    {{ "name": "label", "type": "string" }},
                    {{ "name": "phase", "type": "lab.Phase" }},
                    {{ "name": "masses", "type": "List<float>" }},
                    {{ "name": "grams", "type": "float", "oneof": "quantity" }},
                    {{ "name": "moles", "type": "float", "oneof": "quantity" }}
                ] }}
            ]
        }}"#
    )
    .unwrap();

    let registry = TypeRegistry::load(file.path()).unwrap();
    assert_eq!(registry.message_names(), vec!["lab.Sample"]);
    assert_eq!(registry.enum_names(), vec!["lab.Phase"]);

    let masses = registry.field_of("lab.Sample", "masses").unwrap();
    assert_eq!(masses.type_ref, TypeRef::list(TypeRef::FLOAT));
    assert_eq!(registry.classify(&masses.type_ref).unwrap(), FieldKind::ListOfLiteral);
    assert_eq!(registry.oneof_group_of("lab.Sample", "moles").unwrap(), Some("quantity"));
}

#[test]
fn test_every_fixture_field_classifies() {
    let registry = fixtures::registry();
    registry.validate().unwrap();

    let kinds: Vec<FieldKind> = registry
        .fields_of(REACTION)
        .unwrap()
        .iter()
        .map(|f| registry.classify(&f.type_ref).unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::ListOfLiteral,
            FieldKind::MapOfMessage,
            FieldKind::ListOfMessage,
            FieldKind::MapOfLiteral,
            FieldKind::Literal,
            FieldKind::OptionalLiteral,
            FieldKind::Literal,
        ]
    );
    assert!(registry.is_enum(WORKUP_TYPE));
}

#[test]
fn test_sample_reaction_json_round_trip() {
    let registry = fixtures::registry();
    let reaction = fixtures::sample_reaction();

    let json = registry.message_to_json(&reaction).unwrap();
    assert_eq!(json["workups"][1]["type"], json!("EXTRACTION"));
    assert_eq!(json["raw"], json!("AJ+Slg=="));
    assert!(json.get("is_automated").is_none());

    let back = registry.message_from_json(REACTION, &json).unwrap();
    assert_eq!(registry.message_to_json(&back).unwrap(), json);
}

#[test]
fn test_oneof_from_json_keeps_last_member() {
    let registry = fixtures::registry();
    let message = registry
        .message_from_json(TAGGED, &json!({ "name": "t", "a": 0 }))
        .unwrap();
    assert_eq!(message.get("a"), Some(&Value::int(0)));
    // a set oneof member is written even when it holds the default
    assert_eq!(registry.message_to_json(&message).unwrap(), json!({ "name": "t", "a": 0 }));
}

#[test]
fn test_corrupt_bytes_in_message_json() {
    let registry = fixtures::registry();
    let err = registry
        .message_from_json(REACTION, &json!({ "raw": "%%%" }))
        .unwrap_err();
    assert!(matches!(err, SchemaError::CorruptBinary(_)));
}
