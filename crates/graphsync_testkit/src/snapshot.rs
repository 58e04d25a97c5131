//! JSON snapshots of object graphs.
//!
//! A snapshot is a deep copy serialized to JSON. Comparing snapshots taken
//! before and after a call shows whether the call touched a graph.

use graphsync_model::{ObjectRef, Value};

/// Serialized form of a graph at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(serde_json::Value);

impl Snapshot {
    /// Captures `object` and everything reachable from it.
    pub fn of(object: &ObjectRef) -> Self {
        Self::of_value(&Value::Object(object.clone()))
    }

    /// Captures any value.
    pub fn of_value(value: &Value) -> Self {
        Self(serde_json::to_value(value).expect("Failed to serialize graph"))
    }

    /// The JSON form.
    pub fn json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Asserts that `object` still matches `before`.
pub fn assert_unchanged(before: &Snapshot, object: &ObjectRef) {
    let after = Snapshot::of(object);
    assert_eq!(
        before.json(),
        after.json(),
        "graph changed:\nbefore: {}\nafter:  {}",
        before.json(),
        after.json()
    );
}
