//! Typed records and shared object handles.

use crate::value::Value;
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Name of a DTO or Entity type.
///
/// Cheap to clone; compares and hashes like the underlying string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Creates a type name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for TypeName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&TypeName> for TypeName {
    fn from(t: &TypeName) -> Self {
        t.clone()
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// A typed record: the unit of a DTO or Entity graph.
#[derive(Debug, Clone)]
pub struct Object {
    type_name: TypeName,
    fields: BTreeMap<String, Value>,
}

impl Object {
    /// Creates an empty record of the given type.
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Returns the record's type.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Returns a field value; absent fields read as `Null`.
    pub fn get(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or(Value::Null)
    }

    /// Sets a field value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Iterates over the fields that have been set.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

/// Shared handle to an [`Object`].
///
/// Cloning the handle shares the instance. Equality (`==`) is deep;
/// [`ObjectRef::ptr_eq`] compares identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Creates a new empty instance of the given type.
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self(Arc::new(RwLock::new(Object::new(type_name))))
    }

    /// Sets a field and returns the handle, for building fixtures.
    #[must_use]
    pub fn with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Returns the type of the referenced record.
    pub fn type_name(&self) -> TypeName {
        self.0.read().type_name.clone()
    }

    /// Reads a field; absent fields read as `Null`.
    pub fn get(&self, field: &str) -> Value {
        self.0.read().get(field)
    }

    /// Returns true if the field has been set (possibly to `Null`).
    pub fn has(&self, field: &str) -> bool {
        self.0.read().fields.contains_key(field)
    }

    /// Writes a field.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.write().set(field, value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&self, field: &str) -> Option<Value> {
        self.0.write().fields.remove(field)
    }

    /// Names of the fields that have been set.
    pub fn field_names(&self) -> Vec<String> {
        self.0.read().fields.keys().cloned().collect()
    }

    /// Snapshot of the record. Nested handles are shared, not copied.
    pub fn snapshot(&self) -> Object {
        self.0.read().clone()
    }

    /// Returns true if both handles reference the same instance.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the referenced instance, stable for its lifetime.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Copies the record and everything reachable from it.
    ///
    /// The graph must be acyclic.
    #[must_use]
    pub fn deep_clone(&self) -> ObjectRef {
        let guard = self.0.read();
        let mut copy = Object::new(guard.type_name.clone());
        for (name, value) in &guard.fields {
            copy.fields.insert(name.clone(), value.deep_clone());
        }
        ObjectRef(Arc::new(RwLock::new(copy)))
    }
}

impl From<Object> for ObjectRef {
    fn from(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.0.read();
        let b = other.0.read();
        a.type_name == b.type_name && a.fields == b.fields
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.0.read();
        let mut s = f.debug_struct(guard.type_name.as_str());
        for (name, value) in &guard.fields {
            s.field(name, value);
        }
        s.finish()
    }
}
