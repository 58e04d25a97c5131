//! # graphsync testkit
//!
//! Test utilities for graphsync.
//!
//! This crate provides:
//! - An order domain fixture (catalog, bindings, factory, registry)
//! - Property-based test generators using proptest
//! - JSON snapshots of object graphs
//! - Test logging through `tracing-subscriber`
//!
//! ## Usage
//!
//! ```rust
//! use graphsync_testkit::prelude::*;
//!
//! let kit = TestContext::orders();
//! let dto = order_dto(7, &["x", "y"]);
//! let entity = kit.new_entity("Order");
//! kit.to_entity(&dto, &entity).unwrap();
//! assert_eq!(tag_names(&entity), vec!["x", "y"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod snapshot;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::snapshot::*;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use snapshot::*;
