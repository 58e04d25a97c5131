//! Assemblers.
//!
//! An [`Assembler`] translates between one DTO type and one entity type by
//! running its pipes in binding order. A [`CompositeAssembler`] picks an
//! assembler per entity at runtime. Both are obtained from an
//! [`AssemblerContext`], which builds and caches them.

mod composite;
mod context;
mod pair;

pub use composite::{CompositeAssembler, CompositeBuilder, EntityPredicate};
pub use context::{AssemblerContext, AssemblerContextBuilder};
pub use pair::Assembler;

use crate::capability::Registry;
use crate::error::CoreResult;
use crate::factory::BeanFactory;
use graphsync_model::{CollectionRef, ObjectRef, TypeName, Value};

/// Translation between DTO and entity graphs.
///
/// `entity` arguments are usually objects. Composite assemblers also
/// accept a collection of entities used together to fill one DTO.
pub trait DtoAssembler: Send + Sync {
    /// DTO type produced by this assembler.
    fn dto_type(&self) -> &TypeName;

    /// Fills `dto` from `entity`.
    fn assemble_dto(
        &self,
        dto: &ObjectRef,
        entity: &Value,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()>;

    /// Creates one DTO per entity and appends them to `dtos`, which must be
    /// empty.
    fn assemble_dtos(
        &self,
        dtos: &CollectionRef,
        entities: &CollectionRef,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()>;

    /// Fills `entity` from `dto`.
    fn assemble_entity(
        &self,
        dto: &ObjectRef,
        entity: &Value,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()>;

    /// Creates one entity per DTO and appends them to `entities`, which
    /// must be empty.
    fn assemble_entities(
        &self,
        dtos: &CollectionRef,
        entities: &CollectionRef,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()>;

    /// Drops pipes and delegates. Later calls fail.
    fn release_resources(&self);
}
