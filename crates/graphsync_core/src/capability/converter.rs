//! Value converters.

use crate::error::CoreResult;
use crate::factory::BeanFactory;
use graphsync_model::{ObjectRef, Value};
use std::fmt;

/// Bidirectional value transformation for one binding.
///
/// Converters are user code looked up by key at translation time. They
/// must not keep per-call state.
pub trait ValueConverter: Send + Sync {
    /// Converts an entity-side value into its DTO representation.
    fn convert_to_dto(&self, value: &Value, factory: &dyn BeanFactory) -> CoreResult<Value>;

    /// Converts a DTO-side value into its entity representation.
    ///
    /// `entity` is the entity object that owns the bound field, so that
    /// converters can merge into existing state.
    fn convert_to_entity(
        &self,
        value: &Value,
        entity: &Value,
        factory: &dyn BeanFactory,
    ) -> CoreResult<Value>;
}

type ToDto = Box<dyn Fn(&Value) -> CoreResult<Value> + Send + Sync>;
type ToEntity = Box<dyn Fn(&Value, &Value) -> CoreResult<Value> + Send + Sync>;

/// Converter built from two closures.
///
/// The closures see the value and, for the entity direction, the owning
/// entity; the factory is not exposed.
pub struct FnConverter {
    to_dto: ToDto,
    to_entity: ToEntity,
}

impl FnConverter {
    /// Creates a converter from its two directions.
    pub fn new<D, E>(to_dto: D, to_entity: E) -> Self
    where
        D: Fn(&Value) -> CoreResult<Value> + Send + Sync + 'static,
        E: Fn(&Value, &Value) -> CoreResult<Value> + Send + Sync + 'static,
    {
        Self {
            to_dto: Box::new(to_dto),
            to_entity: Box::new(to_entity),
        }
    }
}

impl ValueConverter for FnConverter {
    fn convert_to_dto(&self, value: &Value, _factory: &dyn BeanFactory) -> CoreResult<Value> {
        (self.to_dto)(value)
    }

    fn convert_to_entity(
        &self,
        value: &Value,
        entity: &Value,
        _factory: &dyn BeanFactory,
    ) -> CoreResult<Value> {
        (self.to_entity)(value, entity)
    }
}

impl fmt::Debug for FnConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter").finish_non_exhaustive()
    }
}

/// Registry key under which a nested assembly finds its parent entity.
///
/// While a sub-entity of type `child` is assembled from its DTO, the
/// registry seen by its pipes carries a [`ParentEntityConverter`] under
/// `parent_converter_key(parent, child)`.
pub fn parent_converter_key(parent_type: &str, child_type: &str) -> String {
    format!("{parent_type}-{child_type}")
}

/// Converter that yields the parent entity of a nested assembly.
///
/// Bind it on a virtual or back-reference field of the child to wire the
/// child to the entity that owns it.
#[derive(Debug, Clone)]
pub struct ParentEntityConverter {
    parent: ObjectRef,
}

impl ParentEntityConverter {
    /// Wraps the parent entity.
    pub fn new(parent: ObjectRef) -> Self {
        Self { parent }
    }

    /// The wrapped parent.
    pub fn parent(&self) -> &ObjectRef {
        &self.parent
    }
}

impl ValueConverter for ParentEntityConverter {
    fn convert_to_dto(&self, value: &Value, _factory: &dyn BeanFactory) -> CoreResult<Value> {
        Ok(value.clone())
    }

    fn convert_to_entity(
        &self,
        _value: &Value,
        _entity: &Value,
        _factory: &dyn BeanFactory,
    ) -> CoreResult<Value> {
        Ok(Value::Object(self.parent.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::KeyedFactory;

    #[test]
    fn fn_converter_runs_both_directions() {
        let converter = FnConverter::new(
            |v| Ok(Value::Text(v.as_integer().unwrap_or_default().to_string())),
            |v, _| Ok(Value::Integer(v.as_text().unwrap_or("0").parse().unwrap_or(0))),
        );
        let factory = KeyedFactory::new();

        let dto = converter.convert_to_dto(&Value::Integer(42), &factory).unwrap();
        assert_eq!(dto, Value::Text("42".into()));

        let entity = converter
            .convert_to_entity(&Value::Text("7".into()), &Value::Null, &factory)
            .unwrap();
        assert_eq!(entity, Value::Integer(7));
    }

    #[test]
    fn parent_converter_yields_parent() {
        let parent = ObjectRef::new("Order");
        let converter = ParentEntityConverter::new(parent.clone());
        let factory = KeyedFactory::new();

        let out = converter
            .convert_to_entity(&Value::Null, &Value::Null, &factory)
            .unwrap();
        assert!(out.same(&Value::Object(parent)));
    }

    #[test]
    fn parent_key_names_both_types() {
        assert_eq!(parent_converter_key("Order", "Line"), "Order-Line");
    }
}
