//! Binding declarations.
//!
//! A [`Binding`] ties one DTO field to one entity field (or path of
//! fields) and says how values move between them. Bindings are plain data;
//! they are checked and turned into pipes when an assembler is built.
//!
//! ```
//! use graphsync_core::{Binding, CollectionSpec, FieldMatcher, MatcherRef};
//!
//! let bindings = vec![
//!     Binding::field("name"),
//!     Binding::field("city").entity("address.city").entity_bean_key("Address"),
//!     Binding::field("total").read_only().converter("money"),
//!     Binding::collection(
//!         "tags",
//!         CollectionSpec::new().matcher(MatcherRef::instance(FieldMatcher::new("name"))),
//!     )
//!     .dto_bean_key("TagDto")
//!     .entity_bean_key("Tag"),
//! ];
//! assert_eq!(bindings[1].entity_path(), vec!["address", "city"]);
//! ```

mod registry;

pub use registry::BindingRegistry;

use crate::capability::MatcherRef;
use crate::types::{PATH_SEPARATOR, VIRTUAL_PREFIX};
use graphsync_model::TypeName;

fn non_empty(key: impl Into<String>) -> Option<String> {
    let key = key.into();
    (!key.is_empty()).then_some(key)
}

/// Parent back-reference settings of a field binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// Field of the nested DTO that holds the parent's primary key.
    pub primary_key: String,
    /// Registry key of the [`EntityRetriever`](crate::EntityRetriever).
    pub retriever: String,
}

/// Settings of a collection binding.
#[derive(Debug, Clone, Default)]
pub struct CollectionSpec {
    /// Factory key of the DTO collection instance.
    pub dto_collection_key: Option<String>,
    /// Factory key of the entity collection instance.
    pub entity_collection_key: Option<String>,
    /// Entity element type used to resolve element assemblers.
    pub element_type: Option<TypeName>,
    /// Factory key naming the entity element type.
    pub element_type_key: Option<String>,
    /// Correlates DTO and entity elements.
    pub matcher: Option<MatcherRef>,
}

impl CollectionSpec {
    /// Creates empty collection settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the DTO collection factory key.
    #[must_use]
    pub fn dto_collection_key(mut self, key: impl Into<String>) -> Self {
        self.dto_collection_key = non_empty(key);
        self
    }

    /// Sets the entity collection factory key.
    #[must_use]
    pub fn entity_collection_key(mut self, key: impl Into<String>) -> Self {
        self.entity_collection_key = non_empty(key);
        self
    }

    /// Sets the entity element type.
    #[must_use]
    pub fn element_type(mut self, type_name: impl Into<TypeName>) -> Self {
        self.element_type = Some(type_name.into());
        self
    }

    /// Sets the factory key naming the entity element type.
    #[must_use]
    pub fn element_type_key(mut self, key: impl Into<String>) -> Self {
        self.element_type_key = non_empty(key);
        self
    }

    /// Sets the matcher.
    #[must_use]
    pub fn matcher(mut self, matcher: MatcherRef) -> Self {
        self.matcher = Some(matcher);
        self
    }
}

/// Settings of a map binding.
///
/// The DTO side is always a map. The entity side is either a map or a
/// collection keyed by [`MapSpec::entity_collection_map_key`].
#[derive(Debug, Clone, Default)]
pub struct MapSpec {
    /// Factory key of the DTO map instance.
    pub dto_map_key: Option<String>,
    /// Factory key of the entity container instance.
    pub entity_container_key: Option<String>,
    /// Entity element type used to resolve element assemblers.
    pub element_type: Option<TypeName>,
    /// Factory key naming the entity element type.
    pub element_type_key: Option<String>,
    /// Field of entity elements whose value keys the DTO map.
    pub entity_collection_map_key: Option<String>,
    /// Whether entity map keys, rather than values, are the elements.
    pub use_entity_map_key: bool,
    /// Correlates DTO and entity elements.
    pub matcher: Option<MatcherRef>,
}

impl MapSpec {
    /// Creates empty map settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the DTO map factory key.
    #[must_use]
    pub fn dto_map_key(mut self, key: impl Into<String>) -> Self {
        self.dto_map_key = non_empty(key);
        self
    }

    /// Sets the entity container factory key.
    #[must_use]
    pub fn entity_container_key(mut self, key: impl Into<String>) -> Self {
        self.entity_container_key = non_empty(key);
        self
    }

    /// Sets the entity element type.
    #[must_use]
    pub fn element_type(mut self, type_name: impl Into<TypeName>) -> Self {
        self.element_type = Some(type_name.into());
        self
    }

    /// Sets the factory key naming the entity element type.
    #[must_use]
    pub fn element_type_key(mut self, key: impl Into<String>) -> Self {
        self.element_type_key = non_empty(key);
        self
    }

    /// Keys the DTO map by this field of entity collection elements.
    #[must_use]
    pub fn entity_collection_map_key(mut self, field: impl Into<String>) -> Self {
        self.entity_collection_map_key = non_empty(field);
        self
    }

    /// Treats entity map keys as the elements.
    #[must_use]
    pub fn use_entity_map_key(mut self) -> Self {
        self.use_entity_map_key = true;
        self
    }

    /// Sets the matcher.
    #[must_use]
    pub fn matcher(mut self, matcher: MatcherRef) -> Self {
        self.matcher = Some(matcher);
        self
    }
}

/// Kind of a binding.
#[derive(Debug, Clone)]
pub enum BindingKind {
    /// Single value, possibly a nested object.
    Field {
        /// Parent back-reference settings.
        parent: Option<ParentRef>,
    },
    /// Collection of elements.
    Collection(CollectionSpec),
    /// Keyed map of elements.
    Map(MapSpec),
}

/// Declaration of one DTO field binding.
#[derive(Debug, Clone)]
pub struct Binding {
    dto_field: String,
    entity_field: String,
    read_only: bool,
    converter: Option<String>,
    dto_bean_key: Option<String>,
    entity_bean_keys: Vec<String>,
    kind: BindingKind,
}

impl Binding {
    fn with_kind(dto_field: impl Into<String>, kind: BindingKind) -> Self {
        let dto_field = dto_field.into();
        Self {
            entity_field: dto_field.clone(),
            dto_field,
            read_only: false,
            converter: None,
            dto_bean_key: None,
            entity_bean_keys: Vec::new(),
            kind,
        }
    }

    /// Binds a field to the entity field of the same name.
    pub fn field(dto_field: impl Into<String>) -> Self {
        Self::with_kind(dto_field, BindingKind::Field { parent: None })
    }

    /// Binds a field to the entity itself. Needs a converter.
    pub fn virtual_field(dto_field: impl Into<String>) -> Self {
        let mut binding = Self::field(dto_field);
        binding.entity_field = format!("{VIRTUAL_PREFIX}{}", binding.dto_field);
        binding
    }

    /// Binds a nested DTO to a parent entity looked up by primary key.
    pub fn parent(
        dto_field: impl Into<String>,
        primary_key: impl Into<String>,
        retriever: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            dto_field,
            BindingKind::Field {
                parent: Some(ParentRef {
                    primary_key: primary_key.into(),
                    retriever: retriever.into(),
                }),
            },
        )
    }

    /// Binds a collection.
    pub fn collection(dto_field: impl Into<String>, spec: CollectionSpec) -> Self {
        Self::with_kind(dto_field, BindingKind::Collection(spec))
    }

    /// Binds a map.
    pub fn map(dto_field: impl Into<String>, spec: MapSpec) -> Self {
        Self::with_kind(dto_field, BindingKind::Map(spec))
    }

    /// Sets the entity field or dotted path. Empty keeps the default.
    #[must_use]
    pub fn entity(mut self, path: impl Into<String>) -> Self {
        if let Some(path) = non_empty(path) {
            self.entity_field = path;
        }
        self
    }

    /// Copies entity to DTO only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Routes values through the converter registered under `key`.
    #[must_use]
    pub fn converter(mut self, key: impl Into<String>) -> Self {
        self.converter = non_empty(key);
        self
    }

    /// Factory key of nested DTO instances.
    #[must_use]
    pub fn dto_bean_key(mut self, key: impl Into<String>) -> Self {
        self.dto_bean_key = non_empty(key);
        self
    }

    /// Appends a factory key for the next entity hop.
    ///
    /// Keys are positional: one per segment of the entity path, the last
    /// one naming nested or element entity instances.
    #[must_use]
    pub fn entity_bean_key(mut self, key: impl Into<String>) -> Self {
        self.entity_bean_keys.push(key.into());
        self
    }

    /// Replaces all entity factory keys.
    #[must_use]
    pub fn entity_bean_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_bean_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// DTO field name.
    pub fn dto_field(&self) -> &str {
        &self.dto_field
    }

    /// Entity field or dotted path, as declared.
    pub fn entity_field(&self) -> &str {
        &self.entity_field
    }

    /// Returns true if values only flow from entity to DTO.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Converter registry key.
    pub fn converter_key(&self) -> Option<&str> {
        self.converter.as_deref()
    }

    /// Factory key of nested DTO instances.
    pub fn dto_key(&self) -> Option<&str> {
        self.dto_bean_key.as_deref()
    }

    /// Entity factory key for hop `index`; empty keys read as absent.
    pub fn entity_key_at(&self, index: usize) -> Option<&str> {
        self.entity_bean_keys
            .get(index)
            .map(String::as_str)
            .filter(|k| !k.is_empty())
    }

    /// Binding kind.
    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    /// Returns true if the binding reads the entity itself.
    pub fn is_virtual(&self) -> bool {
        self.entity_field.starts_with(VIRTUAL_PREFIX)
    }

    /// Segments of the entity path. Virtual bindings have one segment.
    pub fn entity_path(&self) -> Vec<&str> {
        if self.is_virtual() {
            return vec![self.entity_field.as_str()];
        }
        self.entity_field.split(PATH_SEPARATOR).collect()
    }
}
