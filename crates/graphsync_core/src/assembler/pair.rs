//! Assembler for one DTO/entity type pair.

use super::{AssemblerContext, DtoAssembler};
use crate::capability::Registry;
use crate::error::{CoreError, CoreResult};
use crate::factory::{create_object, BeanFactory};
use crate::pipe::{Pipe, SyncContext};
use crate::types::Side;
use graphsync_model::{CollectionRef, ObjectRef, TypeName, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

type Pipes = Arc<[Box<dyn Pipe>]>;

/// Translates between one DTO type and one entity type.
///
/// Pipes run in binding order and the first failure aborts the call;
/// fields already written stay written. An assembler is immutable after
/// construction and may be used from many threads at once.
pub struct Assembler {
    dto_type: TypeName,
    entity_type: TypeName,
    pipes: RwLock<Option<Pipes>>,
    context: Weak<AssemblerContext>,
}

impl Assembler {
    pub(crate) fn new(
        dto_type: TypeName,
        entity_type: TypeName,
        pipes: Vec<Box<dyn Pipe>>,
        context: Weak<AssemblerContext>,
    ) -> Self {
        Self {
            dto_type,
            entity_type,
            pipes: RwLock::new(Some(pipes.into())),
            context,
        }
    }

    /// Entity type handled by this assembler.
    pub fn entity_type(&self) -> &TypeName {
        &self.entity_type
    }

    /// Bound `(dto field, entity field)` pairs, in execution order.
    pub fn bindings(&self) -> Vec<(String, String)> {
        self.pipes
            .read()
            .as_ref()
            .map(|pipes| {
                pipes
                    .iter()
                    .map(|p| (p.dto_field().to_string(), p.entity_field().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true once resources have been released.
    pub fn is_released(&self) -> bool {
        self.pipes.read().is_none()
    }

    fn released(&self) -> CoreError {
        CoreError::Released {
            dto_type: self.dto_type.to_string(),
            entity_type: self.entity_type.to_string(),
        }
    }

    fn pipes(&self) -> CoreResult<Pipes> {
        self.pipes.read().clone().ok_or_else(|| self.released())
    }

    fn context(&self) -> CoreResult<Arc<AssemblerContext>> {
        self.context.upgrade().ok_or_else(|| self.released())
    }

    fn check_instance(
        &self,
        context: &AssemblerContext,
        side: Side,
        object: &ObjectRef,
    ) -> CoreResult<()> {
        if !context.config().check_instance_types {
            return Ok(());
        }
        let expected = match side {
            Side::Dto => &self.dto_type,
            Side::Entity => &self.entity_type,
        };
        let actual = object.type_name();
        if context.catalog().is_assignable(expected, &actual) {
            Ok(())
        } else {
            Err(CoreError::InvalidInstance {
                side,
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    fn entity_object<'v>(&self, entity: &'v Value) -> CoreResult<&'v ObjectRef> {
        entity.as_object().ok_or_else(|| CoreError::InvalidInstance {
            side: Side::Entity,
            expected: self.entity_type.to_string(),
            actual: entity.kind_name().to_string(),
        })
    }

    /// Runs every pipe from entity to DTO.
    pub(crate) fn sync_dto(
        &self,
        dto: &ObjectRef,
        entity: &ObjectRef,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()> {
        trace!(dto_type = %self.dto_type, entity_type = %self.entity_type, depth = ctx.depth(), "assemble dto");
        for pipe in self.pipes()?.iter() {
            pipe.sync_to_dto(Some(entity), dto, ctx)?;
        }
        Ok(())
    }

    /// Runs every pipe from DTO to entity.
    pub(crate) fn sync_entity(
        &self,
        dto: &ObjectRef,
        entity: &ObjectRef,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()> {
        trace!(dto_type = %self.dto_type, entity_type = %self.entity_type, depth = ctx.depth(), "assemble entity");
        for pipe in self.pipes()?.iter() {
            pipe.sync_to_entity(Some(dto), entity, ctx)?;
        }
        Ok(())
    }
}

impl DtoAssembler for Assembler {
    fn dto_type(&self) -> &TypeName {
        &self.dto_type
    }

    fn assemble_dto(
        &self,
        dto: &ObjectRef,
        entity: &Value,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()> {
        let context = self.context()?;
        let entity = self.entity_object(entity)?;
        self.check_instance(&context, Side::Dto, dto)?;
        self.check_instance(&context, Side::Entity, entity)?;
        self.sync_dto(dto, entity, &SyncContext::new(registry, factory, &context))
    }

    fn assemble_dtos(
        &self,
        dtos: &CollectionRef,
        entities: &CollectionRef,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()> {
        if !dtos.is_empty() {
            return Err(CoreError::InvalidDtoCollection);
        }
        let context = self.context()?;
        let ctx = SyncContext::new(registry, factory, &context);
        for entity in entities.items() {
            let entity = self.entity_object(&entity)?;
            self.check_instance(&context, Side::Entity, entity)?;
            let dto = create_object(factory, &self.dto_type, &self.dto_type, Side::Dto)?;
            self.sync_dto(&dto, entity, &ctx)?;
            dtos.push(dto);
        }
        Ok(())
    }

    fn assemble_entity(
        &self,
        dto: &ObjectRef,
        entity: &Value,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()> {
        let context = self.context()?;
        let entity = self.entity_object(entity)?;
        self.check_instance(&context, Side::Dto, dto)?;
        self.check_instance(&context, Side::Entity, entity)?;
        self.sync_entity(dto, entity, &SyncContext::new(registry, factory, &context))
    }

    fn assemble_entities(
        &self,
        dtos: &CollectionRef,
        entities: &CollectionRef,
        registry: &Registry,
        factory: &dyn BeanFactory,
    ) -> CoreResult<()> {
        if !entities.is_empty() {
            return Err(CoreError::InvalidEntityCollection);
        }
        let context = self.context()?;
        let ctx = SyncContext::new(registry, factory, &context);
        for dto in dtos.items() {
            let dto = dto.as_object().ok_or_else(|| CoreError::InvalidInstance {
                side: Side::Dto,
                expected: self.dto_type.to_string(),
                actual: dto.kind_name().to_string(),
            })?;
            self.check_instance(&context, Side::Dto, dto)?;
            let entity = create_object(factory, &self.entity_type, &self.entity_type, Side::Entity)?;
            self.sync_entity(dto, &entity, &ctx)?;
            entities.push(entity);
        }
        Ok(())
    }

    fn release_resources(&self) {
        *self.pipes.write() = None;
    }
}

impl fmt::Debug for Assembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembler")
            .field("dto_type", &self.dto_type)
            .field("entity_type", &self.entity_type)
            .field("bindings", &self.bindings())
            .finish()
    }
}
