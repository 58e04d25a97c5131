//! `serde` serialization of graph values.
//!
//! Objects serialize as maps with a leading `@type` entry followed by their
//! fields in name order, collections as sequences and maps as sequences of
//! `[key, value]` pairs (keys need not be strings). Serialization walks the
//! graph, so it must be acyclic.

use crate::container::{CollectionRef, MapRef};
use crate::object::{ObjectRef, TypeName};
use crate::value::Value;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Name of the synthetic entry carrying an object's type.
pub const TYPE_ENTRY: &str = "@type";

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Object(o) => o.serialize(serializer),
            Value::Collection(c) => c.serialize(serializer),
            Value::Map(m) => m.serialize(serializer),
        }
    }
}

impl Serialize for TypeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let object = self.snapshot();
        let fields: Vec<_> = object.fields().collect();
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry(TYPE_ENTRY, object.type_name())?;
        for (name, value) in fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for CollectionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items = self.items();
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in &items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl Serialize for MapRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut seq = serializer.serialize_seq(Some(entries.len()))?;
        for (k, v) in &entries {
            seq.serialize_element(&(k, v))?;
        }
        seq.end()
    }
}
