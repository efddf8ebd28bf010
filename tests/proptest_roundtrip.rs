use bplist00::{Dictionary, Value};

use proptest::prelude::*;

/// ASCII-only so that every generated string round-trips through either the
/// ascii or utf16 wire encoding without lossy conversion.
fn ascii_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,16}"
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        any::<f64>().prop_map(Value::from),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(Value::Data),
        ascii_string().prop_map(Value::String),
    ]
}

fn value_tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            proptest::collection::vec((ascii_string().prop_map(Value::String), inner), 0..8)
                .prop_map(|pairs| Value::Dictionary(pairs.into_iter().collect::<Dictionary>())),
        ]
    })
}

proptest! {
    #[test]
    fn test_generate_then_parse_round_trips(value in value_tree()) {
        let document = bplist00::generate(&value).unwrap();
        let parsed = bplist00::parse(&document).unwrap();
        prop_assert_eq!(parsed, value);
    }
}

proptest! {
    #[test]
    fn test_integer_round_trips_exactly(value in any::<i64>()) {
        let document = bplist00::generate(&Value::Integer(value)).unwrap();
        let parsed = bplist00::parse(&document).unwrap();
        prop_assert_eq!(parsed, Value::Integer(value));
    }
}
