//! Capability registry.
//!
//! Converters, retrievers and matchers are user code. Bindings refer to
//! them by string key; the [`Registry`] passed to each translation call
//! maps those keys to typed capabilities.

mod converter;
mod matcher;
mod retriever;

pub use converter::{parent_converter_key, FnConverter, ParentEntityConverter, ValueConverter};
pub use matcher::{FieldMatcher, FnMatcher, Matcher, MatcherCache, MatcherRef, ValueMatcher};
pub use retriever::{EntityRetriever, MemoryRetriever};

pub(crate) use matcher::BoundMatcher;

use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered capability.
#[derive(Clone)]
pub enum Capability {
    /// Value converter.
    Converter(Arc<dyn ValueConverter>),
    /// Entity retriever.
    Retriever(Arc<dyn EntityRetriever>),
    /// Element matcher.
    Matcher(Arc<dyn Matcher>),
}

impl Capability {
    /// Name of the capability kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Converter(_) => "converter",
            Self::Retriever(_) => "retriever",
            Self::Matcher(_) => "matcher",
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(..)", self.kind_name())
    }
}

/// Map from capability key to capability.
///
/// Cheap to clone; capabilities are shared.
#[derive(Clone, Default)]
pub struct Registry {
    entries: HashMap<String, Capability>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability, returning the one it replaces.
    pub fn insert(&mut self, key: impl Into<String>, capability: Capability) -> Option<Capability> {
        self.entries.insert(key.into(), capability)
    }

    /// Registers a converter.
    pub fn register_converter(&mut self, key: impl Into<String>, converter: impl ValueConverter + 'static) {
        self.insert(key, Capability::Converter(Arc::new(converter)));
    }

    /// Registers a retriever.
    pub fn register_retriever(&mut self, key: impl Into<String>, retriever: impl EntityRetriever + 'static) {
        self.insert(key, Capability::Retriever(Arc::new(retriever)));
    }

    /// Registers a matcher.
    pub fn register_matcher(&mut self, key: impl Into<String>, matcher: impl Matcher + 'static) {
        self.insert(key, Capability::Matcher(Arc::new(matcher)));
    }

    /// Registers a converter, builder style.
    #[must_use]
    pub fn with_converter(mut self, key: impl Into<String>, converter: impl ValueConverter + 'static) -> Self {
        self.register_converter(key, converter);
        self
    }

    /// Registers a retriever, builder style.
    #[must_use]
    pub fn with_retriever(mut self, key: impl Into<String>, retriever: impl EntityRetriever + 'static) -> Self {
        self.register_retriever(key, retriever);
        self
    }

    /// Registers a matcher, builder style.
    #[must_use]
    pub fn with_matcher(mut self, key: impl Into<String>, matcher: impl Matcher + 'static) -> Self {
        self.register_matcher(key, matcher);
        self
    }

    /// Returns the capability under `key`.
    pub fn get(&self, key: &str) -> Option<&Capability> {
        self.entries.get(key)
    }

    /// Returns true if `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes a capability.
    pub fn remove(&mut self, key: &str) -> Option<Capability> {
        self.entries.remove(key)
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this registry with one extra capability.
    #[must_use]
    pub fn overlay(&self, key: impl Into<String>, capability: Capability) -> Self {
        let mut copy = self.clone();
        copy.insert(key, capability);
        copy
    }

    pub(crate) fn converter(
        &self,
        key: &str,
        dto_field: &str,
        entity_field: &str,
    ) -> CoreResult<Arc<dyn ValueConverter>> {
        match self.entries.get(key) {
            Some(Capability::Converter(converter)) => Ok(converter.clone()),
            Some(other) => Err(CoreError::NotAConverter {
                dto_field: dto_field.to_string(),
                key: key.to_string(),
                actual: other.kind_name(),
            }),
            None => Err(CoreError::ConverterNotFound {
                dto_field: dto_field.to_string(),
                entity_field: entity_field.to_string(),
                key: key.to_string(),
            }),
        }
    }

    pub(crate) fn retriever(
        &self,
        key: &str,
        dto_field: &str,
        entity_field: &str,
    ) -> CoreResult<Arc<dyn EntityRetriever>> {
        match self.entries.get(key) {
            Some(Capability::Retriever(retriever)) => Ok(retriever.clone()),
            Some(other) => Err(CoreError::NotARetriever {
                dto_field: dto_field.to_string(),
                key: key.to_string(),
                actual: other.kind_name(),
            }),
            None => Err(CoreError::RetrieverNotFound {
                dto_field: dto_field.to_string(),
                entity_field: entity_field.to_string(),
                key: key.to_string(),
            }),
        }
    }

    pub(crate) fn matcher(
        &self,
        key: &str,
        dto_field: &str,
        entity_field: &str,
    ) -> CoreResult<Arc<dyn Matcher>> {
        match self.entries.get(key) {
            Some(Capability::Matcher(matcher)) => Ok(matcher.clone()),
            Some(other) => Err(CoreError::NotAMatcher {
                dto_field: dto_field.to_string(),
                key: key.to_string(),
                actual: other.kind_name(),
            }),
            None => Err(CoreError::MatcherNotFound {
                dto_field: dto_field.to_string(),
                entity_field: entity_field.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.iter().map(|(k, v)| (k, v.kind_name())).collect();
        keys.sort();
        f.debug_struct("Registry").field("entries", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use graphsync_model::{ObjectRef, Value};

    fn registry() -> Registry {
        Registry::new()
            .with_converter("upper", FnConverter::new(|v| Ok(v.clone()), |v, _| Ok(v.clone())))
            .with_matcher("byValue", ValueMatcher)
            .with_retriever("customers", MemoryRetriever::new())
    }

    #[test]
    fn typed_lookup() {
        let r = registry();
        assert!(r.converter("upper", "a", "b").is_ok());
        assert!(r.matcher("byValue", "a", "b").is_ok());
        assert!(r.retriever("customers", "a", "b").is_ok());
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn missing_key_is_capability_error() {
        let r = registry();
        let err = r.converter("lower", "name", "name").err().unwrap();
        assert!(matches!(err, CoreError::ConverterNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::CapabilityResolution);
    }

    #[test]
    fn wrong_kind_is_capability_error() {
        let r = registry();
        let err = r.converter("byValue", "name", "name").err().unwrap();
        assert!(matches!(err, CoreError::NotAConverter { actual: "matcher", .. }));
        assert_eq!(err.kind(), ErrorKind::CapabilityResolution);

        let err = r.matcher("upper", "tags", "tags").err().unwrap();
        assert!(matches!(err, CoreError::NotAMatcher { actual: "converter", .. }));

        let err = r.retriever("upper", "parent", "parent").err().unwrap();
        assert!(matches!(err, CoreError::NotARetriever { .. }));
    }

    #[test]
    fn overlay_leaves_original_untouched() {
        let r = registry();
        let parent = ObjectRef::new("Order");
        let key = parent_converter_key("Order", "Line");
        let child = r.overlay(
            key.clone(),
            Capability::Converter(Arc::new(ParentEntityConverter::new(parent))),
        );
        assert!(child.contains(&key));
        assert!(child.contains("upper"));
        assert!(!r.contains(&key));

        let converter = child.converter(&key, "order", "#this#").unwrap();
        let factory = crate::factory::KeyedFactory::new();
        let out = converter
            .convert_to_entity(&Value::Null, &Value::Null, &factory)
            .unwrap();
        assert!(out.as_object().is_some());
    }
}
