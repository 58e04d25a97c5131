//! Integration tests for collection and map reconciliation.

use graphsync_core::{ErrorKind, MatcherRef};
use graphsync_model::{CollectionRef, MapRef, ObjectRef, Value};
use graphsync_testkit::prelude::*;
use proptest::prelude::*;

fn fresh_order() -> ObjectRef {
    ObjectRef::new("Order").with("tags", CollectionRef::sequence())
}

fn line(order: &ObjectRef, sku: &str) -> Option<ObjectRef> {
    order
        .get("lines")
        .as_map()
        .and_then(|lines| lines.get(&Value::from(sku)))
        .and_then(|line| line.as_object().cloned())
}

#[test]
fn test_tags_are_created_in_fresh_entity() {
    init_test_logging();
    let kit = TestContext::orders();
    let order = fresh_order();
    let tags = order.get("tags");

    kit.to_entity(&order_dto(7, &["x", "y"]), &order).unwrap();

    assert_eq!(order.get("id"), Value::Integer(7));
    assert_eq!(tag_names(&order), vec!["x", "y"]);
    let x = find_tag(&order, "x").unwrap();
    assert_eq!(x.type_name().as_str(), "Tag");
    assert_eq!(x.get("weight"), Value::Integer(1));
    // reconciled in place
    assert!(tags.as_collection().unwrap().ptr_eq(order.get("tags").as_collection().unwrap()));
}

#[test]
fn test_resync_keeps_matched_tags() {
    let kit = TestContext::orders();
    let order = fresh_order();
    kit.to_entity(&order_dto(7, &["x", "y"]), &order).unwrap();
    let y = find_tag(&order, "y").unwrap();

    kit.to_entity(&order_dto(7, &["y", "z"]), &order).unwrap();

    assert_eq!(tag_names(&order), vec!["y", "z"]);
    assert!(find_tag(&order, "x").is_none());
    assert!(find_tag(&order, "y").unwrap().ptr_eq(&y));
}

#[test]
fn test_matched_tag_is_updated_in_place() {
    let kit = TestContext::orders();
    let order = fresh_order();
    kit.to_entity(&order_dto(1, &["x"]), &order).unwrap();
    let x = find_tag(&order, "x").unwrap();

    let dto = order_dto(1, &["x"]);
    let items = dto.get("tags");
    items.as_collection().unwrap().items()[0]
        .as_object()
        .unwrap()
        .set("weight", 5i64);
    kit.to_entity(&dto, &order).unwrap();

    assert!(find_tag(&order, "x").unwrap().ptr_eq(&x));
    assert_eq!(x.get("weight"), Value::Integer(5));
}

#[test]
fn test_null_dto_collection_empties_entity() {
    let kit = TestContext::orders();
    let order = fresh_order();
    kit.to_entity(&order_dto(1, &["x", "y"]), &order).unwrap();

    let dto = order_dto(1, &[]);
    dto.set("tags", Value::Null);
    kit.to_entity(&dto, &order).unwrap();

    assert!(tag_names(&order).is_empty());
    assert!(!order.get("tags").is_null());
}

#[test]
fn test_absent_entity_collection_is_created() {
    let kit = TestContext::orders();
    let order = ObjectRef::new("Order");
    kit.to_entity(&order_dto(1, &["x"]), &order).unwrap();

    assert_eq!(tag_names(&order), vec!["x"]);
    assert_eq!(order.get("labels").as_collection().map(CollectionRef::len), Some(0));
    assert_eq!(order.get("lines").as_map().map(MapRef::len), Some(0));
}

#[test]
fn test_scalar_labels_reconcile_by_value() {
    let kit = TestContext::orders();
    let order = fresh_order();

    let dto = order_dto(1, &[]);
    dto.set("labels", CollectionRef::from_values(Default::default(), ["a", "b"]));
    kit.to_entity(&dto, &order).unwrap();
    let labels = order.get("labels");
    assert_eq!(labels.as_collection().unwrap().items(), vec![Value::from("a"), Value::from("b")]);

    dto.set("labels", CollectionRef::from_values(Default::default(), ["b", "c"]));
    kit.to_entity(&dto, &order).unwrap();
    assert_eq!(
        order.get("labels").as_collection().unwrap().items(),
        vec![Value::from("b"), Value::from("c")]
    );
    assert!(labels.as_collection().unwrap().ptr_eq(order.get("labels").as_collection().unwrap()));
}

#[test]
fn test_lines_map_reconciles_by_sku() {
    let kit = TestContext::orders();
    let order = fresh_order();
    let dto = order_dto(1, &[]);
    with_lines(&dto, &[("A", 1), ("B", 2)]);
    kit.to_entity(&dto, &order).unwrap();
    let b = line(&order, "B").unwrap();
    assert_eq!(b.get("qty"), Value::Integer(2));

    with_lines(&dto, &[("B", 5), ("C", 1)]);
    kit.to_entity(&dto, &order).unwrap();

    assert!(line(&order, "A").is_none());
    assert!(line(&order, "B").unwrap().ptr_eq(&b));
    assert_eq!(b.get("qty"), Value::Integer(5));
    assert_eq!(line(&order, "C").unwrap().type_name().as_str(), "OrderLine");
}

#[test]
fn test_swapped_line_keys_keep_both_lines() {
    let kit = TestContext::orders();
    let order = fresh_order();
    let dto = order_dto(1, &[]);
    with_lines(&dto, &[("A", 1), ("B", 2)]);
    kit.to_entity(&dto, &order).unwrap();
    let a = line(&order, "A").unwrap();
    let b = line(&order, "B").unwrap();

    dto.set(
        "lines",
        MapRef::from_entries([("A", line_dto("B", 3)), ("B", line_dto("A", 4))]),
    );
    kit.to_entity(&dto, &order).unwrap();

    assert_eq!(order.get("lines").as_map().unwrap().len(), 2);
    assert!(line(&order, "A").unwrap().ptr_eq(&b));
    assert!(line(&order, "B").unwrap().ptr_eq(&a));
    assert_eq!(b.get("qty"), Value::Integer(3));
    assert_eq!(a.get("qty"), Value::Integer(4));
}

#[test]
fn test_rekeyed_line_keeps_its_entity() {
    let kit = TestContext::orders();
    let order = fresh_order();
    let dto = order_dto(1, &[]);
    with_lines(&dto, &[("A", 1)]);
    kit.to_entity(&dto, &order).unwrap();
    let a = line(&order, "A").unwrap();

    dto.set("lines", MapRef::from_entries([("Z", line_dto("A", 6))]));
    kit.to_entity(&dto, &order).unwrap();

    assert_eq!(order.get("lines").as_map().unwrap().len(), 1);
    assert!(line(&order, "A").is_none());
    assert!(line(&order, "Z").unwrap().ptr_eq(&a));
    assert_eq!(a.get("qty"), Value::Integer(6));
}

#[test]
fn test_loosely_matched_label_takes_dto_value() {
    use graphsync_core::{Binding, BindingRegistry, CollectionSpec, CoreError, FnMatcher};
    use graphsync_model::Key;

    let folded = FnMatcher::symmetric(|v| match v {
        Value::Text(s) => Ok(Key::Text(s.to_lowercase())),
        other => Err(CoreError::capability(format!("no key for {}", other.kind_name()))),
    });
    let bindings = BindingRegistry::new()
        .bind(
            "OrderDto",
            "Order",
            [Binding::collection(
                "labels",
                CollectionSpec::new().matcher(MatcherRef::instance(folded)),
            )],
        )
        .unwrap();
    let context = graphsync_core::AssemblerContext::new(order_catalog(), bindings);
    let kit = TestContext::new(context, order_registry(), order_factory());

    let labels = CollectionRef::from_values(Default::default(), ["A", "b"]);
    let order = ObjectRef::new("Order").with("labels", labels.clone());
    let dto = ObjectRef::new("OrderDto")
        .with("labels", CollectionRef::from_values(Default::default(), ["a", "b"]));
    kit.to_entity(&dto, &order).unwrap();

    assert!(labels.ptr_eq(order.get("labels").as_collection().unwrap()));
    assert_eq!(labels.items(), vec![Value::from("b"), Value::from("a")]);
}

#[test]
fn test_entity_to_dto_rebuilds_containers() {
    let kit = TestContext::orders();
    let order = fresh_order();
    let source = order_dto(3, &["x", "y"]);
    with_lines(&source, &[("A", 4)]);
    kit.to_entity(&source, &order).unwrap();

    let stale = CollectionRef::sequence();
    stale.push(tag_dto("old"));
    let dto = ObjectRef::new("OrderDto").with("tags", stale.clone());
    kit.to_dto(&order, &dto).unwrap();

    let tags = dto.get("tags");
    let tags = tags.as_collection().unwrap();
    assert!(!tags.ptr_eq(&stale));
    let names: Vec<Value> = tags
        .items()
        .iter()
        .map(|t| t.as_object().unwrap().get("name"))
        .collect();
    assert_eq!(names, vec![Value::from("x"), Value::from("y")]);
    assert_eq!(tags.items()[0].as_object().unwrap().type_name().as_str(), "TagDto");

    let lines = dto.get("lines");
    let a = lines.as_map().unwrap().get(&Value::from("A")).unwrap();
    assert_eq!(a.as_object().unwrap().get("qty"), Value::Integer(4));
    assert_eq!(dto.get("summary"), Value::from("order #3 (2 tags)"));
}

#[test]
fn test_matcher_resolved_from_registry() {
    use graphsync_core::{Binding, BindingRegistry, CollectionSpec, ValueMatcher};

    let bindings = BindingRegistry::new()
        .bind(
            "OrderDto",
            "Order",
            [Binding::collection(
                "labels",
                CollectionSpec::new().matcher(MatcherRef::key("labelMatcher")),
            )],
        )
        .unwrap();
    let context = graphsync_core::AssemblerContext::new(order_catalog(), bindings);
    let mut kit = TestContext::new(context, order_registry(), order_factory());

    let dto = ObjectRef::new("OrderDto")
        .with("labels", CollectionRef::from_values(Default::default(), ["a"]));
    let order = ObjectRef::new("Order");
    let err = kit.to_entity(&dto, &order).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapabilityResolution);

    kit.registry.register_matcher("labelMatcher", ValueMatcher);
    kit.to_entity(&dto, &order).unwrap();
    assert_eq!(order.get("labels").as_collection().unwrap().len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resync_from_own_dto_is_idempotent(dto in order_dto_strategy()) {
        let kit = TestContext::orders();
        let order = fresh_order();
        kit.to_entity(&dto, &order).unwrap();
        let converged = Snapshot::of(&order);
        let tags = order.get("tags").as_collection().unwrap().items();

        let round_trip = kit.dto_of(&order, "OrderDto").unwrap();
        kit.to_entity(&round_trip, &order).unwrap();

        prop_assert_eq!(Snapshot::of(&order), converged);
        let after = order.get("tags").as_collection().unwrap().items();
        prop_assert_eq!(tags.len(), after.len());
        for (before, after) in tags.iter().zip(&after) {
            prop_assert!(before.same(after));
        }
    }

    #[test]
    fn unchanged_dto_retains_identity(names in unique_names_strategy(6)) {
        let kit = TestContext::orders();
        let order = fresh_order();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        kit.to_entity(&order_dto(1, &names), &order).unwrap();
        let first = order.get("tags").as_collection().unwrap().items();

        kit.to_entity(&order_dto(1, &names), &order).unwrap();
        let second = order.get("tags").as_collection().unwrap().items();

        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert!(a.same(b));
        }
    }
}
