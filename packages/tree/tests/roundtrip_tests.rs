use ordtree_schema::fixtures::{self, COMPOUND, REACTION, TAGGED, TAG};
use ordtree_schema::{Literal, Message, TypeRegistry, Value};
use ordtree_tree::{MessageObjectTree, MttCache};
use std::collections::BTreeMap;

fn assert_round_trip(registry: &TypeRegistry, cache: &mut MttCache, message: &Message) {
    let mtt = cache.get_or_build(registry, message.type_name()).unwrap();
    let mot = MessageObjectTree::build(registry, &mtt, message).unwrap();
    let back = mot.reduce_message(registry).unwrap();

    assert_eq!(
        registry.message_to_json(&back).unwrap(),
        registry.message_to_json(message).unwrap()
    );

    // rebuilding from the reduced message gives the same compacted tree
    let again = MessageObjectTree::build(registry, &mtt, &back).unwrap();
    assert_eq!(again, mot);
}

#[test]
fn test_sample_reaction_round_trip() {
    let registry = fixtures::registry();
    let mut cache = MttCache::new();
    assert_round_trip(&registry, &mut cache, &fixtures::sample_reaction());
}

#[test]
fn test_empty_and_sparse_messages_round_trip() {
    let registry = fixtures::registry();
    let mut cache = MttCache::new();

    assert_round_trip(&registry, &mut cache, &Message::new(REACTION));
    assert_round_trip(&registry, &mut cache, &Message::new(TAGGED).with("a", Value::int(0)));

    let tags = Value::List(vec![
        Value::Message(Message::new(TAG).with("label", Value::string("x"))),
        // an all-default element keeps its position
        Value::Message(Message::new(TAG)),
        Value::Message(Message::new(TAG).with("label", Value::string("z"))),
    ]);
    assert_round_trip(
        &registry,
        &mut cache,
        &Message::new(TAGGED).with("name", Value::string("t")).with("tags", tags),
    );
}

#[test]
fn test_map_of_messages_round_trip() {
    let registry = fixtures::registry();
    let mut cache = MttCache::new();

    let mut inputs = BTreeMap::new();
    for (key, name) in [("a", "acetone"), ("b", ""), ("c", "ethanol")] {
        inputs.insert(
            key.to_string(),
            Value::Message(Message::new(COMPOUND).with("name", Value::string(name))),
        );
    }
    let reaction = Message::new(REACTION).with("inputs", Value::Map(inputs));
    assert_round_trip(&registry, &mut cache, &reaction);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_reduce_does_not_consume_tree() {
    let registry = fixtures::registry();
    let mot = MessageObjectTree::from_message(&registry, &fixtures::sample_reaction()).unwrap();
    let before = mot.clone();
    mot.reduce(&registry).unwrap();
    assert_eq!(mot, before);
}

#[test]
fn test_map_keys_containing_delimiter_round_trip() {
    let registry = fixtures::registry();
    let mut cache = MttCache::new();

    let mut inputs = BTreeMap::new();
    for (key, name) in [("x", "water"), ("x|name", "salt"), (r"x\", "brine")] {
        inputs.insert(
            key.to_string(),
            Value::Message(Message::new(COMPOUND).with("name", Value::string(name))),
        );
    }
    let reaction = Message::new(REACTION).with("inputs", Value::Map(inputs));
    assert_round_trip(&registry, &mut cache, &reaction);

    let mot = MessageObjectTree::from_message(&registry, &reaction).unwrap();
    assert_eq!(
        mot.value_at(r"<ROOT>|inputs|<DictKey>x\|name|name").unwrap(),
        Some(&Literal::String("salt".into()))
    );
    assert_eq!(
        mot.value_at("<ROOT>|inputs|<DictKey>x|name").unwrap(),
        Some(&Literal::String("water".into()))
    );
}
