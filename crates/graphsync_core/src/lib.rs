//! # graphsync core
//!
//! Declarative, bidirectional synchronization between DTO graphs and
//! entity graphs.
//!
//! Bindings declare how each DTO field relates to an entity field or path.
//! An [`AssemblerContext`] compiles the bindings of a type pair into pipes
//! once and caches the resulting [`Assembler`]. Translation then runs the
//! pipes in either direction:
//! - entity to DTO ([`DtoAssembler::assemble_dto`])
//! - DTO to entity ([`DtoAssembler::assemble_entity`])
//!
//! Collections and maps are reconciled in place: existing entity elements
//! are matched by key and updated, stale ones removed, new ones created.
//! Instances are never constructed directly; they come from a caller
//! supplied [`BeanFactory`]. Converters, retrievers and matchers are looked
//! up by key in a per-call [`Registry`].
//!
//! ## Usage
//!
//! ```
//! use graphsync_core::{
//!     AssemblerContext, Binding, BindingRegistry, DtoAssembler, KeyedFactory, Registry,
//! };
//! use graphsync_model::{ObjectRef, TypeCatalog, TypeModel, Value, ValueType};
//!
//! let catalog = TypeCatalog::new()
//!     .with(TypeModel::new("CustomerDto").field("name", ValueType::Text))?
//!     .with(TypeModel::new("Customer").field("fullName", ValueType::Text))?;
//! let bindings = BindingRegistry::new().bind(
//!     "CustomerDto",
//!     "Customer",
//!     [Binding::field("name").entity("fullName")],
//! )?;
//!
//! let context = AssemblerContext::new(catalog, bindings);
//! let assembler = context.assembler("CustomerDto", "Customer")?;
//!
//! let entity = ObjectRef::new("Customer").with("fullName", "Ada Lovelace");
//! let dto = ObjectRef::new("CustomerDto");
//! assembler.assemble_dto(&dto, &Value::Object(entity), &Registry::new(), &KeyedFactory::new())?;
//! assert_eq!(dto.get("name"), Value::from("Ada Lovelace"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod accessor;
mod assembler;
mod binding;
mod capability;
mod config;
mod error;
mod factory;
mod pipe;
mod types;

pub use accessor::{DataReader, DataWriter, RecordSynthesizer, Synthesizer};
pub use assembler::{
    Assembler, AssemblerContext, AssemblerContextBuilder, CompositeAssembler, CompositeBuilder,
    DtoAssembler, EntityPredicate,
};
pub use binding::{
    Binding, BindingKind, BindingRegistry, CollectionSpec, MapSpec, ParentRef,
};
pub use capability::{
    parent_converter_key, Capability, EntityRetriever, FieldMatcher, FnConverter, FnMatcher,
    Matcher, MatcherCache, MatcherRef, MemoryRetriever, ParentEntityConverter, Registry,
    ValueConverter, ValueMatcher,
};
pub use config::AssemblerConfig;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use factory::{BeanFactory, KeyedFactory};
pub use pipe::{CollectionPipe, DataPipe, MapPipe, Pipe, PipeChain, SyncContext};
pub use types::{Side, PATH_SEPARATOR, VIRTUAL_PREFIX};
