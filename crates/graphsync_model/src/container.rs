//! Shared collection and map handles.

use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Semantics of a collection container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionKind {
    /// Ordered list; duplicates allowed.
    #[default]
    Sequence,
    /// Ordered set; inserting a value already present is ignored.
    Set,
}

#[derive(Debug, Clone)]
struct Collection {
    kind: CollectionKind,
    items: Vec<Value>,
}

/// Shared handle to a list or set of values.
///
/// Membership for sets uses [`Value::same`]: identity for handles,
/// equality for scalars.
#[derive(Clone)]
pub struct CollectionRef(Arc<RwLock<Collection>>);

impl CollectionRef {
    /// Creates an empty collection of the given kind.
    pub fn new(kind: CollectionKind) -> Self {
        Self(Arc::new(RwLock::new(Collection {
            kind,
            items: Vec::new(),
        })))
    }

    /// Creates an empty list.
    pub fn sequence() -> Self {
        Self::new(CollectionKind::Sequence)
    }

    /// Creates an empty set.
    pub fn set() -> Self {
        Self::new(CollectionKind::Set)
    }

    /// Creates a collection holding the given values.
    pub fn from_values<I, V>(kind: CollectionKind, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let collection = Self::new(kind);
        for value in values {
            collection.push(value);
        }
        collection
    }

    /// Returns the container kind.
    pub fn kind(&self) -> CollectionKind {
        self.0.read().kind
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.read().items.len()
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.0.read().items.is_empty()
    }

    /// Snapshot of the elements. Handles are shared, not copied.
    pub fn items(&self) -> Vec<Value> {
        self.0.read().items.clone()
    }

    /// Appends a value. Returns false if a set already holds it.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let mut guard = self.0.write();
        if guard.kind == CollectionKind::Set && guard.items.iter().any(|v| v.same(&value)) {
            return false;
        }
        guard.items.push(value);
        true
    }

    /// Returns true if the collection holds this value (by identity).
    pub fn contains(&self, value: &Value) -> bool {
        self.0.read().items.iter().any(|v| v.same(value))
    }

    /// Keeps only the elements for which `keep` returns true.
    ///
    /// Returns the number of removed elements.
    pub fn retain(&self, mut keep: impl FnMut(&Value) -> bool) -> usize {
        let mut guard = self.0.write();
        let before = guard.items.len();
        guard.items.retain(|v| keep(v));
        before - guard.items.len()
    }

    /// Removes every element.
    pub fn clear(&self) {
        self.0.write().items.clear();
    }

    /// Returns true if both handles reference the same instance.
    pub fn ptr_eq(&self, other: &CollectionRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the referenced instance.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Copies the container and everything reachable from it.
    #[must_use]
    pub fn deep_clone(&self) -> CollectionRef {
        let guard = self.0.read();
        Self(Arc::new(RwLock::new(Collection {
            kind: guard.kind,
            items: guard.items.iter().map(Value::deep_clone).collect(),
        })))
    }
}

impl Default for CollectionRef {
    fn default() -> Self {
        Self::sequence()
    }
}

impl PartialEq for CollectionRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.0.read();
        let b = other.0.read();
        a.kind == b.kind && a.items == b.items
    }
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.0.read();
        match guard.kind {
            CollectionKind::Sequence => f.debug_list().entries(guard.items.iter()).finish(),
            CollectionKind::Set => f.debug_set().entries(guard.items.iter()).finish(),
        }
    }
}

/// Shared handle to an insertion-ordered map.
///
/// Keys are compared with [`Value::same`], so object keys match by
/// identity and scalar keys by value.
#[derive(Clone, Default)]
pub struct MapRef(Arc<RwLock<Vec<(Value, Value)>>>);

impl MapRef {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map holding the given entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let map = Self::new();
        for (k, v) in entries {
            map.insert(k, v);
        }
        map
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0.read().clone()
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0
            .read()
            .iter()
            .find(|(k, _)| k.same(key))
            .map(|(_, v)| v.clone())
    }

    /// Inserts or replaces an entry, returning the previous value.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        let mut guard = self.0.write();
        if let Some(slot) = guard.iter_mut().find(|(k, _)| k.same(&key)) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        guard.push((key, value));
        None
    }

    /// Removes the entry stored under `key`.
    pub fn remove(&self, key: &Value) -> Option<Value> {
        let mut guard = self.0.write();
        let index = guard.iter().position(|(k, _)| k.same(key))?;
        Some(guard.remove(index).1)
    }

    /// Keeps only the entries for which `keep` returns true.
    ///
    /// Returns the number of removed entries.
    pub fn retain(&self, mut keep: impl FnMut(&Value, &Value) -> bool) -> usize {
        let mut guard = self.0.write();
        let before = guard.len();
        guard.retain(|(k, v)| keep(k, v));
        before - guard.len()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.0.write().clear();
    }

    /// Returns true if both handles reference the same instance.
    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the referenced instance.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Copies the map and everything reachable from it.
    #[must_use]
    pub fn deep_clone(&self) -> MapRef {
        let guard = self.0.read();
        Self(Arc::new(RwLock::new(
            guard
                .iter()
                .map(|(k, v)| (k.deep_clone(), v.deep_clone()))
                .collect(),
        )))
    }
}

impl PartialEq for MapRef {
    /// Order-insensitive deep comparison of entries.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.0.read();
        let b = other.0.read();
        a.len() == b.len()
            && a.iter()
                .all(|(ka, va)| b.iter().any(|(kb, vb)| ka == kb && va == vb))
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.0.read();
        f.debug_map()
            .entries(guard.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
