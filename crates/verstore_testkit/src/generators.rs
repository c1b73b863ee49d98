//! Property-based test generators using proptest.
//!
//! Provides strategies for generating keys, names and values that pass
//! the datastore's validation rules.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

/// Strategy for generating valid keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_:-]{1,50}").expect("Invalid regex")
}

/// Strategy for generating valid store names.
pub fn store_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for generating finite JSON numbers.
pub fn number_strategy() -> impl Strategy<Value = Number> {
    prop_oneof![
        any::<i64>().prop_map(Number::from),
        (-1.0e12f64..1.0e12f64).prop_filter_map("finite", Number::from_f64),
    ]
}

/// Strategy for generating integers that can be summed without overflow.
pub fn small_int_strategy() -> impl Strategy<Value = i64> {
    -1_000_000i64..1_000_000i64
}

/// Strategy for generating nested JSON values.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        number_strategy().prop_map(Value::Number),
        "[a-z ]{0,16}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Strategy for generating distinct `(key, score)` rows for ordered stores.
pub fn score_rows_strategy(max_rows: usize) -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map(key_strategy(), -1000i64..1000i64, 0..max_rows)
        .prop_map(|rows| rows.into_iter().collect())
}
