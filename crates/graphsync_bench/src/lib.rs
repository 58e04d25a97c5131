//! Benchmark utilities.

use graphsync_model::ObjectRef;
use graphsync_testkit::{order_dto, with_lines};

/// Generate `count` distinct tag names.
pub fn tag_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("tag_{i}")).collect()
}

/// Generate an order DTO with `tags` tags and `lines` order lines.
pub fn order_dto_with(id: i64, tags: usize, lines: usize) -> ObjectRef {
    let names = tag_names(tags);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let dto = order_dto(id, &names);
    let skus: Vec<String> = (0..lines).map(|i| format!("sku_{i}")).collect();
    let lines: Vec<(&str, i64)> = skus.iter().map(|s| (s.as_str(), 1)).collect();
    with_lines(&dto, &lines);
    dto
}
