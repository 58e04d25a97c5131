//! Dynamic graph value, declared field types and correlation keys.

use crate::container::{CollectionRef, MapRef};
use crate::error::{ModelError, ModelResult};
use crate::object::{ObjectRef, TypeName};
use std::fmt;

/// A dynamic value stored in a field of a graph node.
///
/// Scalars are held by value. Objects, collections and maps are shared
/// handles: cloning a `Value::Object` clones the handle, not the object,
/// so two clones observe the same instance. Floats are intentionally not
/// supported; converters can carry decimal data as text.
///
/// `PartialEq` compares deeply (structure and contents). Use
/// [`Value::same`] to test instance identity.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Text string.
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Shared handle to a typed record.
    Object(ObjectRef),
    /// Shared handle to a list or set.
    Collection(CollectionRef),
    /// Shared handle to an insertion-ordered map.
    Map(MapRef),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns a short name for the kind of this value.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Object(_) => "object",
            Value::Collection(_) => "collection",
            Value::Map(_) => "map",
        }
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as bytes, if it is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the object handle, if this value is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the collection handle, if this value is a collection.
    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Get the map handle, if this value is a map.
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the object handle or an error naming the actual kind.
    pub fn expect_object(&self) -> ModelResult<&ObjectRef> {
        self.as_object()
            .ok_or_else(|| ModelError::unexpected_kind("object", self.kind_name()))
    }

    /// Returns the collection handle or an error naming the actual kind.
    pub fn expect_collection(&self) -> ModelResult<&CollectionRef> {
        self.as_collection()
            .ok_or_else(|| ModelError::unexpected_kind("collection", self.kind_name()))
    }

    /// Returns the map handle or an error naming the actual kind.
    pub fn expect_map(&self) -> ModelResult<&MapRef> {
        self.as_map()
            .ok_or_else(|| ModelError::unexpected_kind("map", self.kind_name()))
    }

    /// Identity comparison.
    ///
    /// Handles are the same when they point at the same instance; scalars
    /// are the same when they are equal.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Collection(a), Value::Collection(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Object(_) | Value::Collection(_) | Value::Map(_), _)
            | (_, Value::Object(_) | Value::Collection(_) | Value::Map(_)) => false,
            (a, b) => a == b,
        }
    }

    /// Copies this value and every handle reachable from it.
    ///
    /// The graph must be acyclic.
    #[must_use]
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Object(o) => Value::Object(o.deep_clone()),
            Value::Collection(c) => Value::Collection(c.deep_clone()),
            Value::Map(m) => Value::Map(m.deep_clone()),
            scalar => scalar.clone(),
        }
    }

    /// Returns the runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Any,
            Value::Bool(_) => ValueType::Bool,
            Value::Integer(_) => ValueType::Integer,
            Value::Text(_) => ValueType::Text,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Object(o) => ValueType::Object(Some(o.type_name())),
            Value::Collection(_) => ValueType::Collection,
            Value::Map(_) => ValueType::Map,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<CollectionRef> for Value {
    fn from(c: CollectionRef) -> Self {
        Value::Collection(c)
    }
}

impl From<MapRef> for Value {
    fn from(m: MapRef) -> Self {
        Value::Map(m)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Accepts any value.
    Any,
    /// Boolean field.
    Bool,
    /// Integer field.
    Integer,
    /// Text field.
    Text,
    /// Byte string field.
    Bytes,
    /// Nested object, optionally restricted to a named type.
    Object(Option<TypeName>),
    /// List or set.
    Collection,
    /// Map.
    Map,
}

impl ValueType {
    /// Object of the given type.
    pub fn object(type_name: impl Into<TypeName>) -> Self {
        ValueType::Object(Some(type_name.into()))
    }

    /// Returns true if this type describes a nested object.
    pub fn is_object(&self) -> bool {
        matches!(self, ValueType::Object(_))
    }

    /// Returns the declared object type name, if any.
    pub fn object_type(&self) -> Option<&TypeName> {
        match self {
            ValueType::Object(Some(name)) => Some(name),
            _ => None,
        }
    }

    /// Structural assignability without subtyping.
    ///
    /// A field of this type can receive values of type `other`. Named
    /// object types must match exactly; use the type catalog for
    /// inheritance-aware checks.
    pub fn is_assignable_from(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) => true,
            (ValueType::Object(None), ValueType::Object(_)) => true,
            (ValueType::Object(Some(a)), ValueType::Object(Some(b))) => a == b,
            (a, b) => a == b,
        }
    }

    /// Returns true if `value` may be stored in a field of this type.
    ///
    /// `Null` fits every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (ValueType::Any, _) => true,
            (ValueType::Bool, Value::Bool(_))
            | (ValueType::Integer, Value::Integer(_))
            | (ValueType::Text, Value::Text(_))
            | (ValueType::Bytes, Value::Bytes(_))
            | (ValueType::Collection, Value::Collection(_))
            | (ValueType::Map, Value::Map(_))
            | (ValueType::Object(None), Value::Object(_)) => true,
            (ValueType::Object(Some(name)), Value::Object(o)) => o.type_name() == *name,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Text => write!(f, "text"),
            ValueType::Bytes => write!(f, "bytes"),
            ValueType::Object(None) => write!(f, "object"),
            ValueType::Object(Some(name)) => write!(f, "object<{name}>"),
            ValueType::Collection => write!(f, "collection"),
            ValueType::Map => write!(f, "map"),
        }
    }
}

/// Correlation key used to match DTO and Entity elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Key of a null value.
    Null,
    /// Boolean key.
    Bool(bool),
    /// Integer key.
    Integer(i64),
    /// Text key.
    Text(String),
    /// Byte string key.
    Bytes(Vec<u8>),
    /// Key made of several parts.
    Composite(Vec<Key>),
    /// Instance identity of a handle.
    Identity(usize),
}

impl Key {
    /// Builds a key from a scalar value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotAKey`] for objects, collections and maps.
    pub fn from_value(value: &Value) -> ModelResult<Key> {
        match value {
            Value::Null => Ok(Key::Null),
            Value::Bool(b) => Ok(Key::Bool(*b)),
            Value::Integer(n) => Ok(Key::Integer(*n)),
            Value::Text(s) => Ok(Key::Text(s.clone())),
            Value::Bytes(b) => Ok(Key::Bytes(b.clone())),
            other => Err(ModelError::NotAKey {
                actual: other.kind_name().to_string(),
            }),
        }
    }

    /// Builds an identity key: handles by address, scalars by value.
    pub fn identity(value: &Value) -> Key {
        match value {
            Value::Object(o) => Key::Identity(o.addr()),
            Value::Collection(c) => Key::Identity(c.addr()),
            Value::Map(m) => Key::Identity(m.addr()),
            scalar => Key::from_value(scalar).unwrap_or(Key::Null),
        }
    }
}

impl TryFrom<&Value> for Key {
    type Error = ModelError;

    fn try_from(value: &Value) -> ModelResult<Self> {
        Key::from_value(value)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Integer(n)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => write!(f, "null"),
            Key::Bool(b) => write!(f, "{b}"),
            Key::Integer(n) => write!(f, "{n}"),
            Key::Text(s) => write!(f, "{s:?}"),
            Key::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Key::Composite(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
            Key::Identity(addr) => write!(f, "@{addr:x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_bool(), None);
        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::Text("hello".to_string()).as_text(), Some("hello"));
        assert_eq!(Value::Bytes(vec![1, 2, 3]).as_bytes(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Integer(42));
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from("x"), Value::Text("x".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn same_is_identity_for_handles() {
        let a = ObjectRef::new("Tag").with("name", "x");
        let b = ObjectRef::new("Tag").with("name", "x");

        let va = Value::Object(a.clone());
        assert!(va.same(&Value::Object(a)));
        assert!(!va.same(&Value::Object(b.clone())));
        // deep equality still holds
        assert_eq!(va, Value::Object(b));
    }

    #[test]
    fn same_is_equality_for_scalars() {
        assert!(Value::from("x").same(&Value::from("x")));
        assert!(!Value::from(1i64).same(&Value::from("1")));
    }

    #[test]
    fn value_type_assignability() {
        assert!(ValueType::Any.is_assignable_from(&ValueType::Text));
        assert!(ValueType::Text.is_assignable_from(&ValueType::Text));
        assert!(!ValueType::Text.is_assignable_from(&ValueType::Integer));
        assert!(!ValueType::Text.is_assignable_from(&ValueType::Any));
        assert!(ValueType::Object(None).is_assignable_from(&ValueType::object("Order")));
        assert!(!ValueType::object("Order").is_assignable_from(&ValueType::object("Line")));
    }

    #[test]
    fn value_type_accepts_null() {
        assert!(ValueType::Integer.accepts(&Value::Null));
        assert!(!ValueType::Integer.accepts(&Value::from("7")));
        assert!(ValueType::object("Tag").accepts(&Value::Object(ObjectRef::new("Tag"))));
        assert!(!ValueType::object("Tag").accepts(&Value::Object(ObjectRef::new("Other"))));
    }

    #[test]
    fn key_from_scalars_only() {
        assert_eq!(Key::from_value(&Value::from("y")).unwrap(), Key::from("y"));
        assert_eq!(Key::from_value(&Value::Integer(7)).unwrap(), Key::Integer(7));
        assert!(matches!(
            Key::from_value(&Value::Object(ObjectRef::new("Tag"))),
            Err(ModelError::NotAKey { .. })
        ));
    }

    #[test]
    fn identity_key_tracks_instance() {
        let tag = ObjectRef::new("Tag");
        let k1 = Key::identity(&Value::Object(tag.clone()));
        let k2 = Key::identity(&Value::Object(tag));
        let k3 = Key::identity(&Value::Object(ObjectRef::new("Tag")));
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[test]
    fn key_display() {
        let key = Key::Composite(vec![Key::from("a"), Key::Integer(1)]);
        assert_eq!(key.to_string(), "(\"a\", 1)");
    }
}
