//! Pipes: compiled bindings.
//!
//! Each [`Binding`](crate::Binding) of an assembler is compiled into one
//! [`Pipe`] when the assembler is built. Pipes own the accessors they need
//! and move a single field's value in either direction.
//!
//! - [`DataPipe`]: scalar, converted, nested and parent fields
//! - [`PipeChain`]: walks a dotted entity path to its last hop
//! - [`CollectionPipe`]: reconciles collections element by element
//! - [`MapPipe`]: reconciles maps, or collections exposed as maps

mod builder;
mod chain;
mod collection;
mod data;
mod element;
mod map;

pub(crate) use builder::PipeBuilder;
pub use chain::PipeChain;
pub use collection::CollectionPipe;
pub use data::DataPipe;
pub use map::MapPipe;

use crate::assembler::{Assembler, AssemblerContext};
use crate::capability::Registry;
use crate::error::{CoreError, CoreResult};
use crate::factory::BeanFactory;
use graphsync_model::{ObjectRef, TypeName};
use std::sync::Arc;

/// One compiled binding.
pub trait Pipe: Send + Sync {
    /// DTO field this pipe serves.
    fn dto_field(&self) -> &str;

    /// Entity field or path this pipe serves.
    fn entity_field(&self) -> &str;

    /// Copies the bound value from `dto` into `entity`.
    ///
    /// A `None` DTO leaves the entity untouched.
    fn sync_to_entity(
        &self,
        dto: Option<&ObjectRef>,
        entity: &ObjectRef,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()>;

    /// Copies the bound value from `entity` into `dto`.
    ///
    /// A `None` entity leaves the DTO untouched.
    fn sync_to_dto(
        &self,
        entity: Option<&ObjectRef>,
        dto: &ObjectRef,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()>;
}

/// Per-call state threaded through one translation.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    registry: &'a Registry,
    factory: &'a dyn BeanFactory,
    assemblers: &'a AssemblerContext,
    depth: usize,
}

impl<'a> SyncContext<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        factory: &'a dyn BeanFactory,
        assemblers: &'a AssemblerContext,
    ) -> Self {
        Self {
            registry,
            factory,
            assemblers,
            depth: 0,
        }
    }

    /// Capability registry of this call.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Instance factory of this call.
    pub fn factory(&self) -> &'a dyn BeanFactory {
        self.factory
    }

    /// Nesting depth below the assembler that started the call.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for one level of nesting.
    pub(crate) fn descend(&self) -> CoreResult<Self> {
        let depth = self.depth + 1;
        if let Some(limit) = self.assemblers.config().max_depth {
            if depth > limit {
                return Err(CoreError::DepthExceeded { limit });
            }
        }
        Ok(Self { depth, ..*self })
    }

    /// Same context over another registry.
    pub(crate) fn with_registry<'b>(&self, registry: &'b Registry) -> SyncContext<'b>
    where
        'a: 'b,
    {
        SyncContext {
            registry,
            factory: self.factory,
            assemblers: self.assemblers,
            depth: self.depth,
        }
    }

    /// Assembler for a nested pair.
    pub(crate) fn assembler(
        &self,
        dto_type: &TypeName,
        entity_type: &TypeName,
    ) -> CoreResult<Arc<Assembler>> {
        self.assemblers.assembler(dto_type.clone(), entity_type.clone())
    }
}
