//! # graphsync model
//!
//! Dynamic object graphs for graphsync.
//!
//! This crate provides the in-memory shape that DTO and Entity graphs take
//! when they are handed to the synchronization engine:
//! - [`Value`]: scalars plus shared handles to objects, collections, maps
//! - [`ObjectRef`]: a typed record with identity
//! - [`CollectionRef`] / [`MapRef`]: containers with identity
//! - [`TypeCatalog`]: declared record types, fields and inheritance
//! - [`Key`]: hashable correlation keys for collection reconciliation
//!
//! Handles are `Arc<parking_lot::RwLock<_>>`, so graphs can be moved
//! between threads. A graph must not be mutated from two threads during
//! one translation.
//!
//! ## Usage
//!
//! ```
//! use graphsync_model::{CollectionRef, ObjectRef, Value};
//!
//! let tags = CollectionRef::sequence();
//! tags.push(ObjectRef::new("Tag").with("name", "x"));
//!
//! let order = ObjectRef::new("Order").with("id", 7i64).with("tags", tags);
//! assert_eq!(order.get("id"), Value::Integer(7));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod container;
mod error;
mod object;
mod schema;
mod serialize;
mod value;

pub use container::{CollectionKind, CollectionRef, MapRef};
pub use error::{ModelError, ModelResult};
pub use object::{Object, ObjectRef, TypeName};
pub use schema::{FieldDescriptor, TypeCatalog, TypeModel};
pub use serialize::TYPE_ENTRY;
pub use value::{Key, Value, ValueType};
