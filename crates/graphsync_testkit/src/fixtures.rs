//! Test fixtures.
//!
//! A small order domain used across the test suites: orders with a
//! customer reached through a dotted path, tag objects, scalar labels,
//! order lines keyed by SKU and a virtual summary field.

use graphsync_core::{
    AssemblerConfig, AssemblerContext, Binding, BindingRegistry, CollectionSpec, CoreResult,
    DtoAssembler, FieldMatcher, FnConverter, KeyedFactory, MapSpec, MatcherRef, Registry,
    ValueMatcher,
};
use graphsync_model::{CollectionRef, MapRef, ObjectRef, TypeCatalog, TypeModel, Value, ValueType};
use std::sync::Arc;

/// Registry key of the order summary converter.
pub const SUMMARY_CONVERTER: &str = "orderSummary";

/// Every type of the order domain.
pub const ORDER_TYPES: &[&str] = &[
    "Address",
    "Customer",
    "Tag",
    "TagDto",
    "OrderLine",
    "OrderLineDto",
    "Order",
    "PriorityOrder",
    "OrderDto",
];

/// Type catalog of the order domain.
pub fn order_catalog() -> TypeCatalog {
    let models = [
        TypeModel::new("Address")
            .field("street", ValueType::Text)
            .field("city", ValueType::Text),
        TypeModel::new("Customer")
            .field("id", ValueType::Integer)
            .field("name", ValueType::Text)
            .field("address", ValueType::object("Address")),
        TypeModel::new("Tag")
            .field("name", ValueType::Text)
            .field("weight", ValueType::Integer),
        TypeModel::new("TagDto")
            .field("name", ValueType::Text)
            .field("weight", ValueType::Integer),
        TypeModel::new("OrderLine")
            .field("sku", ValueType::Text)
            .field("qty", ValueType::Integer),
        TypeModel::new("OrderLineDto")
            .field("sku", ValueType::Text)
            .field("qty", ValueType::Integer),
        TypeModel::new("Order")
            .field("id", ValueType::Integer)
            .field("status", ValueType::Text)
            .field("note", ValueType::Text)
            .field("customer", ValueType::object("Customer"))
            .field("tags", ValueType::Collection)
            .field("labels", ValueType::Collection)
            .field("lines", ValueType::Map),
        TypeModel::new("PriorityOrder")
            .extends("Order")
            .field("priority", ValueType::Integer),
        TypeModel::new("OrderDto")
            .field("id", ValueType::Integer)
            .field("status", ValueType::Text)
            .field("note", ValueType::Text)
            .field("customerName", ValueType::Text)
            .field("city", ValueType::Text)
            .field("tags", ValueType::Collection)
            .field("labels", ValueType::Collection)
            .field("lines", ValueType::Map)
            .field("summary", ValueType::Text),
    ];
    let mut catalog = TypeCatalog::new();
    for model in models {
        catalog.declare(model).expect("Failed to declare fixture type");
    }
    catalog
}

/// Bindings of the order domain.
pub fn order_bindings() -> BindingRegistry {
    BindingRegistry::new()
        .bind(
            "OrderDto",
            "Order",
            [
                Binding::field("id"),
                Binding::field("status"),
                Binding::field("note"),
                Binding::field("customerName")
                    .entity("customer.name")
                    .entity_bean_key("Customer"),
                Binding::field("city")
                    .entity("customer.address.city")
                    .entity_bean_keys(["Customer", "Address"]),
                Binding::collection(
                    "tags",
                    CollectionSpec::new().matcher(MatcherRef::instance(FieldMatcher::new("name"))),
                )
                .dto_bean_key("TagDto")
                .entity_bean_key("Tag"),
                Binding::collection(
                    "labels",
                    CollectionSpec::new().matcher(MatcherRef::of::<ValueMatcher>()),
                ),
                Binding::map(
                    "lines",
                    MapSpec::new().matcher(MatcherRef::instance(FieldMatcher::new("sku"))),
                )
                .dto_bean_key("OrderLineDto")
                .entity_bean_key("OrderLine"),
                Binding::virtual_field("summary")
                    .converter(SUMMARY_CONVERTER)
                    .read_only(),
            ],
        )
        .and_then(|b| b.bind("TagDto", "Tag", [Binding::field("name"), Binding::field("weight")]))
        .and_then(|b| {
            b.bind(
                "OrderLineDto",
                "OrderLine",
                [Binding::field("sku"), Binding::field("qty")],
            )
        })
        .expect("Failed to register fixture bindings")
}

/// Factory producing blank instances of every order type, keyed by name.
pub fn order_factory() -> KeyedFactory {
    KeyedFactory::from_catalog(&order_catalog(), ORDER_TYPES)
}

/// Registry holding the order summary converter.
pub fn order_registry() -> Registry {
    Registry::new().with_converter(
        SUMMARY_CONVERTER,
        FnConverter::new(
            |entity| {
                let order = entity.expect_object()?;
                let tags = order.get("tags").as_collection().map_or(0, CollectionRef::len);
                let id = order.get("id").as_integer().unwrap_or_default();
                Ok(Value::Text(format!("order #{id} ({tags} tags)")))
            },
            |_, _| Ok(Value::Null),
        ),
    )
}

/// Builds a tag DTO.
pub fn tag_dto(name: &str) -> ObjectRef {
    ObjectRef::new("TagDto").with("name", name).with("weight", 1i64)
}

/// Builds an order line DTO.
pub fn line_dto(sku: &str, qty: i64) -> ObjectRef {
    ObjectRef::new("OrderLineDto").with("sku", sku).with("qty", qty)
}

/// Builds an open order DTO with the given tags.
pub fn order_dto(id: i64, tags: &[&str]) -> ObjectRef {
    let items = CollectionRef::sequence();
    for name in tags {
        items.push(tag_dto(name));
    }
    ObjectRef::new("OrderDto")
        .with("id", id)
        .with("status", "open")
        .with("tags", items)
}

/// Attaches order lines to an order DTO, keyed by SKU.
pub fn with_lines(dto: &ObjectRef, lines: &[(&str, i64)]) {
    let map = MapRef::new();
    for (sku, qty) in lines {
        map.insert(*sku, line_dto(sku, *qty));
    }
    dto.set("lines", map);
}

/// Names of the tags of an order entity, in collection order.
pub fn tag_names(order: &ObjectRef) -> Vec<String> {
    order
        .get("tags")
        .as_collection()
        .map(|tags| {
            tags.items()
                .iter()
                .filter_map(|t| t.as_object().and_then(|o| o.get("name").as_text().map(str::to_string)))
                .collect()
        })
        .unwrap_or_default()
}

/// Tag object of an order entity by name.
pub fn find_tag(order: &ObjectRef, name: &str) -> Option<ObjectRef> {
    order.get("tags").as_collection().and_then(|tags| {
        tags.items()
            .into_iter()
            .filter_map(|t| t.as_object().cloned())
            .find(|t| t.get("name").as_text() == Some(name))
    })
}

/// A context, registry and factory bundled for one test.
pub struct TestContext {
    /// The assembler context.
    pub context: Arc<AssemblerContext>,
    /// Capabilities passed to every call.
    pub registry: Registry,
    /// Instance factory passed to every call.
    pub factory: KeyedFactory,
}

impl TestContext {
    /// Bundles existing parts.
    pub fn new(context: Arc<AssemblerContext>, registry: Registry, factory: KeyedFactory) -> Self {
        Self {
            context,
            registry,
            factory,
        }
    }

    /// The order domain with the default configuration.
    pub fn orders() -> Self {
        Self::orders_with(AssemblerConfig::default())
    }

    /// The order domain with a custom configuration.
    pub fn orders_with(config: AssemblerConfig) -> Self {
        let context = AssemblerContext::builder(order_catalog())
            .bindings(order_bindings())
            .config(config)
            .build();
        Self::new(context, order_registry(), order_factory())
    }

    /// Creates a blank instance of `type_name`.
    pub fn new_entity(&self, type_name: &str) -> ObjectRef {
        ObjectRef::new(type_name)
    }

    /// Assembles `entity` from `dto` with the pair's assembler.
    pub fn to_entity(&self, dto: &ObjectRef, entity: &ObjectRef) -> CoreResult<()> {
        self.context
            .assembler(dto.type_name(), entity.type_name())?
            .assemble_entity(dto, &Value::Object(entity.clone()), &self.registry, &self.factory)
    }

    /// Assembles `dto` from `entity` with the pair's assembler.
    pub fn to_dto(&self, entity: &ObjectRef, dto: &ObjectRef) -> CoreResult<()> {
        self.context
            .assembler(dto.type_name(), entity.type_name())?
            .assemble_dto(dto, &Value::Object(entity.clone()), &self.registry, &self.factory)
    }

    /// Creates and fills a DTO of `dto_type` from `entity`.
    pub fn dto_of(&self, entity: &ObjectRef, dto_type: &str) -> CoreResult<ObjectRef> {
        let dto = ObjectRef::new(dto_type);
        self.to_dto(entity, &dto)?;
        Ok(dto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_declares_all_types() {
        let catalog = order_catalog();
        for name in ORDER_TYPES {
            assert!(catalog.contains(name), "{name} missing");
        }
        assert!(catalog.is_assignable("Order", "PriorityOrder"));
    }

    #[test]
    fn test_order_assembler_builds() {
        let kit = TestContext::orders();
        let assembler = kit.context.assembler("OrderDto", "Order").unwrap();
        assert_eq!(assembler.bindings().len(), 9);
    }
}
