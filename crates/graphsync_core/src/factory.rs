//! Instance factory.
//!
//! Assemblers never construct DTOs, entities or containers themselves.
//! Every instance is requested from a caller-supplied [`BeanFactory`] under
//! a bean key, which lets callers decide concrete types and defaults.

use crate::error::{CoreError, CoreResult};
use crate::types::Side;
use graphsync_model::{CollectionKind, CollectionRef, MapRef, ObjectRef, TypeCatalog, TypeName, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Keyed source of fresh instances.
pub trait BeanFactory: Send + Sync {
    /// Creates a fresh instance for `key`, or `None` if the key is unknown.
    fn get(&self, key: &str) -> Option<Value>;

    /// Names the object type produced for `key`, without producing one if
    /// possible.
    fn representation(&self, key: &str) -> Option<TypeName> {
        match self.get(key)? {
            Value::Object(object) => Some(object.type_name()),
            _ => None,
        }
    }
}

type Maker = Arc<dyn Fn() -> Value + Send + Sync>;

/// [`BeanFactory`] backed by a map of constructors.
///
/// # Example
///
/// ```
/// use graphsync_core::{BeanFactory, KeyedFactory};
///
/// let factory = KeyedFactory::new()
///     .object("Tag", "Tag")
///     .sequence("TagList");
///
/// assert_eq!(factory.representation("Tag").unwrap(), "Tag");
/// assert!(factory.get("TagList").unwrap().as_collection().is_some());
/// ```
#[derive(Clone, Default)]
pub struct KeyedFactory {
    makers: HashMap<String, Maker>,
    representations: HashMap<String, TypeName>,
}

impl KeyedFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory that makes a blank object for every type in the
    /// catalog, keyed by type name.
    pub fn from_catalog(catalog: &TypeCatalog, type_names: &[&str]) -> Self {
        let mut factory = Self::new();
        for name in type_names.iter().filter(|n| catalog.contains(n)) {
            factory.register_object(*name, *name);
        }
        factory
    }

    /// Registers a blank object of `type_name` under `key`.
    pub fn register_object(&mut self, key: impl Into<String>, type_name: impl Into<TypeName>) {
        let key = key.into();
        let type_name = type_name.into();
        self.representations.insert(key.clone(), type_name.clone());
        self.makers.insert(
            key,
            Arc::new(move || Value::Object(ObjectRef::new(type_name.clone()))),
        );
    }

    /// Registers an arbitrary constructor under `key`.
    pub fn register_with<F>(&mut self, key: impl Into<String>, make: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let key = key.into();
        self.representations.remove(&key);
        self.makers.insert(key, Arc::new(make));
    }

    /// Registers a blank object, builder style.
    #[must_use]
    pub fn object(mut self, key: impl Into<String>, type_name: impl Into<TypeName>) -> Self {
        self.register_object(key, type_name);
        self
    }

    /// Registers an empty sequence, builder style.
    #[must_use]
    pub fn sequence(mut self, key: impl Into<String>) -> Self {
        self.register_with(key, || Value::Collection(CollectionRef::new(CollectionKind::Sequence)));
        self
    }

    /// Registers an empty set, builder style.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>) -> Self {
        self.register_with(key, || Value::Collection(CollectionRef::new(CollectionKind::Set)));
        self
    }

    /// Registers an empty map, builder style.
    #[must_use]
    pub fn map(mut self, key: impl Into<String>) -> Self {
        self.register_with(key, || Value::Map(MapRef::new()));
        self
    }

    /// Registers a constructor, builder style.
    #[must_use]
    pub fn with<F>(mut self, key: impl Into<String>, make: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.register_with(key, make);
        self
    }

    /// Returns true if something is registered under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.makers.contains_key(key)
    }
}

impl BeanFactory for KeyedFactory {
    fn get(&self, key: &str) -> Option<Value> {
        self.makers.get(key).map(|make| make())
    }

    fn representation(&self, key: &str) -> Option<TypeName> {
        if let Some(name) = self.representations.get(key) {
            return Some(name.clone());
        }
        match self.get(key)? {
            Value::Object(object) => Some(object.type_name()),
            _ => None,
        }
    }
}

impl fmt::Debug for KeyedFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.makers.keys().collect();
        keys.sort();
        f.debug_struct("KeyedFactory").field("keys", &keys).finish()
    }
}

fn create(factory: &dyn BeanFactory, key: &str, field: &str, side: Side) -> CoreResult<Value> {
    factory
        .get(key)
        .ok_or_else(|| CoreError::UnableToCreateInstance {
            key: key.to_string(),
            field: field.to_string(),
            side,
        })
}

/// Creates an object through the factory.
pub(crate) fn create_object(
    factory: &dyn BeanFactory,
    key: &str,
    field: &str,
    side: Side,
) -> CoreResult<ObjectRef> {
    match create(factory, key, field, side)? {
        Value::Object(object) => Ok(object),
        other => Err(CoreError::UnexpectedInstance {
            key: key.to_string(),
            expected: "object",
            actual: other.kind_name(),
        }),
    }
}

/// Creates a collection through the factory, or a sequence when no key is
/// given.
pub(crate) fn create_collection(
    factory: &dyn BeanFactory,
    key: Option<&str>,
    field: &str,
    side: Side,
) -> CoreResult<CollectionRef> {
    let Some(key) = key else {
        return Ok(CollectionRef::sequence());
    };
    match create(factory, key, field, side)? {
        Value::Collection(collection) => Ok(collection),
        other => Err(CoreError::UnexpectedInstance {
            key: key.to_string(),
            expected: "collection",
            actual: other.kind_name(),
        }),
    }
}

/// Creates a map through the factory, or an empty map when no key is given.
pub(crate) fn create_map(
    factory: &dyn BeanFactory,
    key: Option<&str>,
    field: &str,
    side: Side,
) -> CoreResult<MapRef> {
    let Some(key) = key else {
        return Ok(MapRef::new());
    };
    match create(factory, key, field, side)? {
        Value::Map(map) => Ok(map),
        other => Err(CoreError::UnexpectedInstance {
            key: key.to_string(),
            expected: "map",
            actual: other.kind_name(),
        }),
    }
}

/// Names the object type registered under `key`.
pub(crate) fn representation_of(
    factory: &dyn BeanFactory,
    key: &str,
    field: &str,
    side: Side,
) -> CoreResult<TypeName> {
    factory
        .representation(key)
        .ok_or_else(|| CoreError::UnableToLocateRepresentation {
            key: key.to_string(),
            field: field.to_string(),
            side,
        })
}
