//! Entity retrieval for parent back-references.

use crate::error::CoreResult;
use graphsync_model::{Key, ObjectRef, TypeName, Value, ValueType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Looks up an existing entity by primary key.
///
/// Used by parent bindings: the DTO carries a nested parent DTO, and only
/// its primary key is used to find the real entity.
pub trait EntityRetriever: Send + Sync {
    /// Returns the entity of `concrete_type` with the given primary key.
    ///
    /// `entity_type` is the declared type of the bound entity field.
    fn retrieve(
        &self,
        entity_type: &ValueType,
        concrete_type: &TypeName,
        primary_key: &Value,
    ) -> CoreResult<Option<ObjectRef>>;
}

/// In-memory retriever keyed by `(type, primary key)`.
///
/// Useful for tests and for callers that preload reference data.
#[derive(Default)]
pub struct MemoryRetriever {
    entities: RwLock<HashMap<(TypeName, Key), ObjectRef>>,
}

impl MemoryRetriever {
    /// Creates an empty retriever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entity under its type and primary key.
    ///
    /// # Errors
    ///
    /// Fails if the primary key is not a scalar.
    pub fn insert(&self, primary_key: &Value, entity: ObjectRef) -> CoreResult<()> {
        let key = Key::from_value(primary_key)?;
        self.entities.write().insert((entity.type_name(), key), entity);
        Ok(())
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl EntityRetriever for MemoryRetriever {
    fn retrieve(
        &self,
        _entity_type: &ValueType,
        concrete_type: &TypeName,
        primary_key: &Value,
    ) -> CoreResult<Option<ObjectRef>> {
        let key = Key::from_value(primary_key)?;
        Ok(self
            .entities
            .read()
            .get(&(concrete_type.clone(), key))
            .cloned())
    }
}

impl fmt::Debug for MemoryRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRetriever")
            .field("len", &self.len())
            .finish()
    }
}
