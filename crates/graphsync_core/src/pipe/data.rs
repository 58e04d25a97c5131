//! Single value pipe.

use super::builder::{LeafSite, PipeBuilder};
use super::{Pipe, SyncContext};
use crate::accessor::{DataReader, DataWriter, DiscardWriter, SelfReader};
use crate::binding::{Binding, BindingKind};
use crate::capability::{parent_converter_key, Capability, ParentEntityConverter};
use crate::error::{CoreError, CoreResult};
use crate::factory::{create_object, representation_of};
use crate::types::Side;
use graphsync_model::{ObjectRef, Value, ValueType};
use std::sync::Arc;
use tracing::{debug, trace};

fn is_object_like(value_type: &ValueType) -> bool {
    matches!(value_type, ValueType::Object(_) | ValueType::Any)
}

struct ParentLink {
    primary_key: Arc<dyn DataReader>,
    retriever: String,
}

/// Moves one value between a DTO field and an entity field.
///
/// Depending on its binding the value is copied as is, passed through a
/// converter, translated by a nested assembler (sub-entity) or resolved to
/// an existing entity by primary key (parent back-reference).
pub struct DataPipe {
    dto_field: String,
    entity_field: String,
    converter: Option<String>,
    dto_key: Option<String>,
    entity_key: Option<String>,
    parent: Option<ParentLink>,
    dto_read: Option<Arc<dyn DataReader>>,
    dto_write: Arc<dyn DataWriter>,
    entity_read: Arc<dyn DataReader>,
    entity_write: Option<Arc<dyn DataWriter>>,
}

impl DataPipe {
    pub(crate) fn build(builder: &PipeBuilder<'_>, site: &LeafSite<'_>) -> CoreResult<Self> {
        let binding: &Binding = site.binding;
        let dto_field = binding.dto_field();
        let read_only = binding.is_read_only();
        let virtual_field = binding.is_virtual();
        let synth = builder.synthesizer;

        if virtual_field && binding.converter_key().is_none() {
            return Err(CoreError::MissingConverter {
                dto_field: dto_field.to_string(),
            });
        }

        let dto_read = if read_only {
            None
        } else {
            Some(synth.reader(site.dto_type, dto_field)?)
        };
        let dto_write = synth.writer(site.dto_type, dto_field)?;

        let (entity_read, entity_write): (Arc<dyn DataReader>, Option<Arc<dyn DataWriter>>) =
            if virtual_field {
                (
                    Arc::new(SelfReader::new(site.entity_type)),
                    Some(Arc::new(DiscardWriter::new())),
                )
            } else {
                let writer = if read_only {
                    None
                } else {
                    Some(synth.writer(site.entity_type, site.entity_field)?)
                };
                (synth.reader(site.entity_type, site.entity_field)?, writer)
            };

        let dto_key = binding.dto_key().map(str::to_string);
        let entity_key = binding.entity_key_at(site.key_index).map(str::to_string);
        let parent_ref = match binding.kind() {
            BindingKind::Field { parent } => parent.as_ref(),
            _ => None,
        };

        let incompatible = || CoreError::IncompatibleTypes {
            dto_field: dto_field.to_string(),
            dto_type: dto_write.value_type().to_string(),
            entity_field: site.entity_field.to_string(),
            entity_type: entity_read.value_type().to_string(),
        };

        if dto_key.is_some() || parent_ref.is_some() {
            if !is_object_like(dto_write.value_type()) || !is_object_like(entity_read.value_type()) {
                return Err(incompatible());
            }
            if dto_key.is_none() {
                return Err(CoreError::MissingBeanKey {
                    field: dto_field.to_string(),
                    side: Side::Dto,
                });
            }
            if entity_key.is_none() && !read_only {
                return Err(CoreError::MissingBeanKey {
                    field: dto_field.to_string(),
                    side: Side::Entity,
                });
            }
        } else if binding.converter_key().is_none() && builder.config.strict_types {
            let catalog = builder.catalog;
            if !catalog.is_type_assignable(dto_write.value_type(), entity_read.value_type()) {
                return Err(incompatible());
            }
            if let (Some(read), Some(write)) = (&dto_read, &entity_write) {
                if !catalog.is_type_assignable(write.value_type(), read.value_type()) {
                    return Err(incompatible());
                }
            }
        }

        let parent = match parent_ref {
            Some(parent) if !read_only => {
                let nested = dto_write.value_type().object_type().cloned().ok_or_else(|| {
                    CoreError::invalid_binding(
                        dto_field,
                        "parent binding needs a declared DTO object type",
                    )
                })?;
                Some(ParentLink {
                    primary_key: synth.reader(&nested, &parent.primary_key)?,
                    retriever: parent.retriever.clone(),
                })
            }
            _ => None,
        };

        Ok(Self {
            dto_field: dto_field.to_string(),
            entity_field: binding.entity_field().to_string(),
            converter: binding.converter_key().map(str::to_string),
            dto_key,
            entity_key,
            parent,
            dto_read,
            dto_write,
            entity_read,
            entity_write,
        })
    }

    fn nested(&self) -> bool {
        self.dto_key.is_some() && self.parent.is_none()
    }

    fn missing_entity_key(&self) -> CoreError {
        CoreError::MissingBeanKey {
            field: self.dto_field.clone(),
            side: Side::Entity,
        }
    }

    /// Assembles a nested entity from its DTO, creating it if absent.
    fn sync_sub_entity(
        &self,
        dto_value: &Value,
        entity: &ObjectRef,
        writer: &dyn DataWriter,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()> {
        let nested_dto = dto_value.expect_object()?;
        let nested_entity = match self.entity_read.read(entity)? {
            Value::Null => {
                let key = self
                    .entity_key
                    .as_deref()
                    .ok_or_else(|| self.missing_entity_key())?;
                let created = create_object(ctx.factory(), key, &self.dto_field, Side::Entity)?;
                writer.write(entity, Value::Object(created.clone()))?;
                created
            }
            existing => existing.expect_object()?.clone(),
        };

        let assembler = ctx.assembler(&nested_dto.type_name(), &nested_entity.type_name())?;
        let registry = ctx.registry().overlay(
            parent_converter_key(&entity.type_name(), &nested_entity.type_name()),
            Capability::Converter(Arc::new(ParentEntityConverter::new(entity.clone()))),
        );
        let nested_ctx = ctx.descend()?;
        assembler.sync_entity(nested_dto, &nested_entity, &nested_ctx.with_registry(&registry))
    }

    /// Resolves a parent back-reference by primary key.
    fn sync_parent(
        &self,
        parent: &ParentLink,
        dto_value: &Value,
        entity: &ObjectRef,
        writer: &dyn DataWriter,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()> {
        if dto_value.is_null() {
            return writer.write(entity, Value::Null);
        }
        let primary_key = parent.primary_key.read(dto_value.expect_object()?)?;
        let key = self
            .entity_key
            .as_deref()
            .ok_or_else(|| self.missing_entity_key())?;
        let concrete = representation_of(ctx.factory(), key, &self.dto_field, Side::Entity)?;
        let retriever = ctx
            .registry()
            .retriever(&parent.retriever, &self.dto_field, &self.entity_field)?;

        let found = retriever.retrieve(self.entity_read.value_type(), &concrete, &primary_key)?;
        if found.is_none() {
            debug!(
                field = %self.entity_field,
                entity_type = %concrete,
                primary_key = ?primary_key,
                "parent entity not found"
            );
        }
        writer.write(entity, found.map_or(Value::Null, Value::Object))
    }
}

impl Pipe for DataPipe {
    fn dto_field(&self) -> &str {
        &self.dto_field
    }

    fn entity_field(&self) -> &str {
        &self.entity_field
    }

    fn sync_to_entity(
        &self,
        dto: Option<&ObjectRef>,
        entity: &ObjectRef,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()> {
        let (Some(dto), Some(dto_read), Some(writer)) = (dto, &self.dto_read, &self.entity_write)
        else {
            return Ok(());
        };
        trace!(dto_field = %self.dto_field, entity_field = %self.entity_field, "sync to entity");

        let dto_value = dto_read.read(dto)?;
        if let Some(parent) = &self.parent {
            return self.sync_parent(parent, &dto_value, entity, writer.as_ref(), ctx);
        }

        let value = match &self.converter {
            Some(key) => {
                let converter = ctx.registry().converter(key, &self.dto_field, &self.entity_field)?;
                converter.convert_to_entity(&dto_value, &Value::Object(entity.clone()), ctx.factory())?
            }
            None => dto_value,
        };

        if !value.is_null() && self.nested() {
            return self.sync_sub_entity(&value, entity, writer.as_ref(), ctx);
        }
        writer.write(entity, value)
    }

    fn sync_to_dto(
        &self,
        entity: Option<&ObjectRef>,
        dto: &ObjectRef,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<()> {
        let Some(entity) = entity else {
            return Ok(());
        };
        trace!(dto_field = %self.dto_field, entity_field = %self.entity_field, "sync to dto");

        let value = self.entity_read.read(entity)?;
        if value.is_null() {
            return self.dto_write.write(dto, Value::Null);
        }

        if let Some(dto_key) = &self.dto_key {
            let nested_entity = value.expect_object()?;
            let nested_dto = create_object(ctx.factory(), dto_key, &self.dto_field, Side::Dto)?;
            let assembler = ctx.assembler(&nested_dto.type_name(), &nested_entity.type_name())?;
            assembler.sync_dto(&nested_dto, nested_entity, &ctx.descend()?)?;
            return self.dto_write.write(dto, Value::Object(nested_dto));
        }

        let value = match &self.converter {
            Some(key) => {
                let converter = ctx.registry().converter(key, &self.dto_field, &self.entity_field)?;
                converter.convert_to_dto(&value, ctx.factory())?
            }
            None => value,
        };
        self.dto_write.write(dto, value)
    }
}
