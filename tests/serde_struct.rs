use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
struct Point {
    x: u64,
    y: u64,
}

#[test]
fn test_struct_roundtrips_through_a_document() {
    let point = Point { x: 1, y: 20 };
    let document = bplist00::to_vec(&point).unwrap();
    let parsed: Point = bplist00::from_slice(&document).unwrap();
    assert_eq!(parsed, point);
}

#[test]
fn test_struct_round_trips_as_a_value() {
    let point = Point { x: 1, y: 20 };
    let document = bplist00::to_vec(&point).unwrap();
    let parsed: bplist00::Value = bplist00::from_slice(&document).unwrap();

    let mut expected = bplist00::Dictionary::new();
    expected.insert(bplist00::Value::from("x"), bplist00::Value::from(1i64));
    expected.insert(bplist00::Value::from("y"), bplist00::Value::from(20i64));
    assert_eq!(parsed, bplist00::Value::Dictionary(expected));
}

#[test]
fn test_nested_collections_roundtrip() {
    let mut input: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    input.insert("odds".to_owned(), vec![1, 3, 5]);
    input.insert("evens".to_owned(), vec![2, 4, 6]);

    let document = bplist00::to_vec(&input).unwrap();
    let parsed: BTreeMap<String, Vec<i64>> = bplist00::from_slice(&document).unwrap();
    assert_eq!(parsed, input);
}
