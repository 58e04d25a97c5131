//! Property-based test generators using proptest.
//!
//! Strategies produce DTO data for the order fixture. Tag and SKU names
//! are unique within one generated value so that matchers keyed on them
//! are stable.

use crate::fixtures::{line_dto, order_dto, with_lines};
use graphsync_model::{ObjectRef, Value};
use proptest::prelude::*;

/// Strategy for generating a tag or SKU name.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex")
}

/// Strategy for generating distinct names, in a random order.
pub fn unique_names_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(name_strategy(), 0..=max)
        .prop_map(|names| names.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Strategy for generating scalar values usable as correlation keys.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        name_strategy().prop_map(Value::Text),
    ]
}

/// Strategy for generating order DTOs with tags and lines.
pub fn order_dto_strategy() -> impl Strategy<Value = ObjectRef> {
    (
        any::<i64>(),
        unique_names_strategy(6),
        prop::collection::btree_map(name_strategy(), 1i64..100, 0..4),
        prop::option::of(name_strategy()),
    )
        .prop_map(|(id, tags, lines, note)| {
            let names: Vec<&str> = tags.iter().map(String::as_str).collect();
            let dto = order_dto(id, &names);
            let lines: Vec<(&str, i64)> = lines.iter().map(|(s, q)| (s.as_str(), *q)).collect();
            with_lines(&dto, &lines);
            dto.set("note", note);
            dto
        })
}

/// Strategy for generating a single order line DTO.
pub fn line_dto_strategy() -> impl Strategy<Value = ObjectRef> {
    (name_strategy(), 1i64..100).prop_map(|(sku, qty)| line_dto(&sku, qty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn unique_names_are_unique(names in unique_names_strategy(8)) {
            let set: HashSet<_> = names.iter().collect();
            prop_assert_eq!(set.len(), names.len());
        }

        #[test]
        fn order_dto_has_type(dto in order_dto_strategy()) {
            let type_name = dto.type_name();
            prop_assert_eq!(type_name.as_str(), "OrderDto");
        }
    }
}
