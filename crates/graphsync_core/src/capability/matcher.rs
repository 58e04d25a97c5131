//! Element matchers and the shared matcher cache.
//!
//! Collection and map reconciliation pairs DTO elements with entity
//! elements through a [`Matcher`]. Each side is reduced to a [`Key`]; equal
//! keys mean the elements describe the same thing.

use crate::error::CoreResult;
use graphsync_model::{Key, Value};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Correlates DTO and entity elements.
pub trait Matcher: Send + Sync {
    /// Key of a DTO element.
    fn dto_key(&self, dto: &Value) -> CoreResult<Key>;

    /// Key of an entity element.
    fn entity_key(&self, entity: &Value) -> CoreResult<Key>;
}

/// Matches scalar elements by value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueMatcher;

impl Matcher for ValueMatcher {
    fn dto_key(&self, dto: &Value) -> CoreResult<Key> {
        Ok(Key::from_value(dto)?)
    }

    fn entity_key(&self, entity: &Value) -> CoreResult<Key> {
        Ok(Key::from_value(entity)?)
    }
}

/// Matches object elements by one field on each side.
///
/// Scalar elements are used as their own key.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    dto_field: String,
    entity_field: String,
}

impl FieldMatcher {
    /// Matches on the same field name on both sides.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            dto_field: field.clone(),
            entity_field: field,
        }
    }

    /// Matches on differently named fields.
    pub fn between(dto_field: impl Into<String>, entity_field: impl Into<String>) -> Self {
        Self {
            dto_field: dto_field.into(),
            entity_field: entity_field.into(),
        }
    }

    fn key_of(value: &Value, field: &str) -> CoreResult<Key> {
        match value {
            Value::Object(object) => Ok(Key::from_value(&object.get(field))?),
            scalar => Ok(Key::from_value(scalar)?),
        }
    }
}

impl Matcher for FieldMatcher {
    fn dto_key(&self, dto: &Value) -> CoreResult<Key> {
        Self::key_of(dto, &self.dto_field)
    }

    fn entity_key(&self, entity: &Value) -> CoreResult<Key> {
        Self::key_of(entity, &self.entity_field)
    }
}

type KeyFn = Arc<dyn Fn(&Value) -> CoreResult<Key> + Send + Sync>;

/// Matcher built from closures.
#[derive(Clone)]
pub struct FnMatcher {
    dto: KeyFn,
    entity: KeyFn,
}

impl FnMatcher {
    /// Uses the same key function on both sides.
    pub fn symmetric<F>(key: F) -> Self
    where
        F: Fn(&Value) -> CoreResult<Key> + Send + Sync + 'static,
    {
        let key: KeyFn = Arc::new(key);
        Self {
            dto: key.clone(),
            entity: key,
        }
    }

    /// Uses one key function per side.
    pub fn new<D, E>(dto: D, entity: E) -> Self
    where
        D: Fn(&Value) -> CoreResult<Key> + Send + Sync + 'static,
        E: Fn(&Value) -> CoreResult<Key> + Send + Sync + 'static,
    {
        Self {
            dto: Arc::new(dto),
            entity: Arc::new(entity),
        }
    }
}

impl Matcher for FnMatcher {
    fn dto_key(&self, dto: &Value) -> CoreResult<Key> {
        (self.dto)(dto)
    }

    fn entity_key(&self, entity: &Value) -> CoreResult<Key> {
        (self.entity)(entity)
    }
}

impl fmt::Debug for FnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMatcher").finish_non_exhaustive()
    }
}

fn make_default<M: Matcher + Default + 'static>() -> Arc<dyn Matcher> {
    Arc::new(M::default())
}

/// How a collection or map binding names its matcher.
#[derive(Clone)]
pub enum MatcherRef {
    /// Looked up in the capability registry at translation time.
    Key(String),
    /// A specific instance.
    Instance(Arc<dyn Matcher>),
    /// A default-constructible matcher type, instantiated once per
    /// [`MatcherCache`].
    Default {
        /// Identity of the matcher type.
        type_id: TypeId,
        /// Name of the matcher type, for diagnostics.
        type_name: &'static str,
        /// Constructor.
        make: fn() -> Arc<dyn Matcher>,
    },
}

impl MatcherRef {
    /// Names a registry key.
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Wraps an instance.
    pub fn instance(matcher: impl Matcher + 'static) -> Self {
        Self::Instance(Arc::new(matcher))
    }

    /// Names a default-constructible matcher type.
    pub fn of<M: Matcher + Default + 'static>() -> Self {
        Self::Default {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            make: make_default::<M>,
        }
    }

    /// Returns the registry key, if this names one.
    pub fn registry_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Debug for MatcherRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Instance(_) => f.write_str("Instance(..)"),
            Self::Default { type_name, .. } => f.debug_tuple("Default").field(type_name).finish(),
        }
    }
}

/// One matcher instance per matcher type.
///
/// Owned by an [`AssemblerContext`](crate::AssemblerContext) and may be
/// shared between contexts. Concurrent first requests for a type agree on
/// a single instance.
#[derive(Default)]
pub struct MatcherCache {
    matchers: RwLock<HashMap<TypeId, Arc<dyn Matcher>>>,
}

impl MatcherCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance for `type_id`, creating it on first use.
    pub fn get_or_insert_with(
        &self,
        type_id: TypeId,
        make: impl FnOnce() -> Arc<dyn Matcher>,
    ) -> Arc<dyn Matcher> {
        if let Some(matcher) = self.matchers.read().get(&type_id) {
            return matcher.clone();
        }
        self.matchers.write().entry(type_id).or_insert_with(make).clone()
    }

    /// Returns the shared instance of `M`.
    pub fn get<M: Matcher + Default + 'static>(&self) -> Arc<dyn Matcher> {
        self.get_or_insert_with(TypeId::of::<M>(), make_default::<M>)
    }

    /// Number of cached matcher types.
    pub fn len(&self) -> usize {
        self.matchers.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.matchers.read().is_empty()
    }

    /// Drops every cached instance.
    pub fn clear(&self) {
        self.matchers.write().clear();
    }
}

impl fmt::Debug for MatcherCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherCache").field("len", &self.len()).finish()
    }
}

/// Matcher of a built pipe: static, or a registry key resolved per call.
#[derive(Clone)]
pub(crate) enum BoundMatcher {
    Registry(String),
    Static(Arc<dyn Matcher>),
}

impl BoundMatcher {
    pub(crate) fn bind(matcher: &MatcherRef, cache: &MatcherCache) -> Self {
        match matcher {
            MatcherRef::Key(key) => Self::Registry(key.clone()),
            MatcherRef::Instance(instance) => Self::Static(instance.clone()),
            MatcherRef::Default { type_id, make, .. } => {
                Self::Static(cache.get_or_insert_with(*type_id, *make))
            }
        }
    }

    pub(crate) fn resolve(
        &self,
        registry: &super::Registry,
        dto_field: &str,
        entity_field: &str,
    ) -> CoreResult<Arc<dyn Matcher>> {
        match self {
            Self::Static(matcher) => Ok(matcher.clone()),
            Self::Registry(key) => registry.matcher(key, dto_field, entity_field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use graphsync_model::ObjectRef;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn value_matcher_keys_scalars() {
        let m = ValueMatcher;
        assert_eq!(m.dto_key(&Value::Text("x".into())).unwrap(), Key::from("x"));
        assert!(m.entity_key(&Value::Object(ObjectRef::new("Tag"))).is_err());
    }

    #[test]
    fn field_matcher_reads_each_side() {
        let m = FieldMatcher::between("code", "name");
        let dto = Value::Object(ObjectRef::new("TagDto").with("code", "x"));
        let entity = Value::Object(ObjectRef::new("Tag").with("name", "x"));
        assert_eq!(m.dto_key(&dto).unwrap(), m.entity_key(&entity).unwrap());
        assert_eq!(m.dto_key(&Value::Text("x".into())).unwrap(), Key::from("x"));
    }

    #[test]
    fn fn_matcher_symmetric() {
        let m = FnMatcher::symmetric(|v| match v {
            Value::Text(s) => Ok(Key::Text(s.to_lowercase())),
            other => Err(CoreError::capability(format!("no key for {}", other.kind_name()))),
        });
        assert_eq!(
            m.dto_key(&Value::Text("X".into())).unwrap(),
            m.entity_key(&Value::Text("x".into())).unwrap()
        );
        assert!(m.dto_key(&Value::Integer(1)).is_err());
    }

    static CREATED: AtomicUsize = AtomicUsize::new(0);

    struct Counting;

    impl Default for Counting {
        fn default() -> Self {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Counting
        }
    }

    impl Matcher for Counting {
        fn dto_key(&self, dto: &Value) -> CoreResult<Key> {
            Ok(Key::identity(dto))
        }

        fn entity_key(&self, entity: &Value) -> CoreResult<Key> {
            Ok(Key::identity(entity))
        }
    }

    #[test]
    fn cache_instantiates_once_per_type() {
        let cache = MatcherCache::new();
        let a = cache.get::<Counting>();
        let b = BoundMatcher::bind(&MatcherRef::of::<Counting>(), &cache);
        let BoundMatcher::Static(b) = b else {
            panic!("default matcher should bind statically");
        };
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_shared_across_threads() {
        let cache = Arc::new(MatcherCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get::<ValueMatcher>())
            })
            .collect();
        let matchers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(matchers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn matcher_ref_debug() {
        assert_eq!(format!("{:?}", MatcherRef::key("tags")), "Key(\"tags\")");
        assert_eq!(MatcherRef::key("tags").registry_key(), Some("tags"));
    }
}
