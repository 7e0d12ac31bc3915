//! Host value behaviour: conversions, graceful indexing, and the serde
//! bridge.

use pretty_assertions::assert_eq;
use yawl::{parse, Mapping, Value};

#[test]
fn from_conversions() {
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(7i32), Value::Int(7));
    assert_eq!(Value::from(7u64), Value::Int(7));
    assert_eq!(Value::from(u64::MAX), Value::BigInt(u64::MAX as i128));
    assert_eq!(Value::from(1.5), Value::Float(1.5));
    assert_eq!(Value::from("s"), Value::String("s".to_string()));
    assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(
        Value::from(vec!["a", "b"]),
        Value::Sequence(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn mapping_from_iterator_keeps_order() {
    let value: Value = vec![("z", 1i64), ("a", 2), ("m", 3)].into_iter().collect();
    let keys: Vec<&str> = value
        .as_mapping()
        .unwrap()
        .keys()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn graceful_indexing_never_panics() {
    let value = parse("a:\n  b: [1, 2]\n").unwrap();
    assert_eq!(value["a"]["b"][1].as_i64(), Some(2));
    assert!(value["a"]["missing"][9]["deeper"].is_null());
    assert!(value[0].is_null());
}

#[test]
fn get_looks_up_string_keys() {
    let value = parse("name: yawl\n").unwrap();
    assert_eq!(value.get("name").and_then(Value::as_str), Some("yawl"));
    assert!(value.get("other").is_none());
}

#[test]
fn int_and_big_int_compare_equal() {
    assert_eq!(Value::Int(7), Value::BigInt(7));
    assert_ne!(Value::Int(7), Value::BigInt(8));
}

#[test]
fn serde_serialize_to_json() {
    let value = parse("name: yawl\ncount: 3\nratio: 0.5\nok: true\nnothing: ~\nitems: [a, b]\n")
        .unwrap();
    let json = serde_json::to_value(&value).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "yawl",
            "count": 3,
            "ratio": 0.5,
            "ok": true,
            "nothing": null,
            "items": ["a", "b"],
        })
    );
}

#[test]
fn serde_deserialize_from_json() {
    let value: Value = serde_json::from_str(r#"{"a": [1, 2.5, null], "b": "text"}"#).unwrap();
    assert_eq!(value["a"][0].as_i64(), Some(1));
    assert_eq!(value["a"][1].as_f64(), Some(2.5));
    assert!(value["a"][2].is_null());
    assert_eq!(value["b"].as_str(), Some("text"));
}

#[test]
fn serde_round_trip_matches_parse() {
    let yaml = parse("a: 1\nb: [true, x]\n").unwrap();
    let through_json: Value =
        serde_json::from_str(&serde_json::to_string(&yaml).unwrap()).unwrap();
    assert_eq!(yaml, through_json);
}

#[test]
fn sequence_and_mapping_mutation() {
    let mut value = parse("items: [1]\n").unwrap();
    value
        .as_mapping_mut()
        .unwrap()
        .get_mut(&Value::from("items"))
        .unwrap()
        .as_sequence_mut()
        .unwrap()
        .push(Value::Int(2));
    assert_eq!(value["items"][1].as_i64(), Some(2));
}

#[test]
fn scalar_checks() {
    assert!(Value::Null.is_scalar());
    assert!(Value::Int(1).is_scalar());
    assert!(!Value::Sequence(Vec::new()).is_scalar());
    assert!(!Value::Mapping(Mapping::new()).is_scalar());
}
