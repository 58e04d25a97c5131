//! Dotted entity paths.

use super::{Pipe, SyncContext};
use crate::accessor::{DataReader, DataWriter};
use crate::error::{CoreError, CoreResult};
use crate::factory::create_object;
use crate::types::Side;
use graphsync_model::{ObjectRef, Value};
use std::sync::Arc;

/// One intermediate hop of an entity path.
pub(crate) struct ChainLink {
    pub field: String,
    pub reader: Arc<dyn DataReader>,
    pub writer: Option<Arc<dyn DataWriter>>,
    pub bean_key: Option<String>,
}

/// Walks the intermediate hops of a dotted entity path (`a.b.c`) and hands
/// the last object to the pipe bound to the final segment.
///
/// Entity to DTO stops at the first absent hop. DTO to entity creates
/// absent hops through their bean keys, unless the DTO value is null.
pub struct PipeChain {
    dto_field: String,
    entity_field: String,
    links: Vec<ChainLink>,
    dto_read: Option<Arc<dyn DataReader>>,
    inner: Box<dyn Pipe>,
}

impl PipeChain {
    pub(crate) fn new(
        dto_field: &str,
        entity_field: &str,
        links: Vec<ChainLink>,
        dto_read: Option<Arc<dyn DataReader>>,
        inner: Box<dyn Pipe>,
    ) -> Self {
        Self {
            dto_field: dto_field.to_string(),
            entity_field: entity_field.to_string(),
            links,
            dto_read,
            inner,
        }
    }

    /// Number of intermediate hops.
    pub fn hops(&self) -> usize {
        self.links.len()
    }
}

impl Pipe for PipeChain {
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
        let (Some(dto), Some(dto_read)) = (dto, &self.dto_read) else {
            return Ok(());
        };
        let dto_is_null = dto_read.read(dto)?.is_null();

        let mut current = entity.clone();
        for link in &self.links {
            current = match link.reader.read(&current)? {
                Value::Null => {
                    if dto_is_null {
                        return Ok(());
                    }
                    let (Some(key), Some(writer)) = (&link.bean_key, &link.writer) else {
                        return Err(CoreError::MissingBeanKey {
                            field: self.dto_field.clone(),
                            side: Side::Entity,
                        });
                    };
                    let created = create_object(ctx.factory(), key, &link.field, Side::Entity)?;
                    writer.write(&current, Value::Object(created.clone()))?;
                    created
                }
                next => next.expect_object()?.clone(),
            };
        }
        self.inner.sync_to_entity(Some(dto), &current, ctx)
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
        let mut current = entity.clone();
        for link in &self.links {
            current = match link.reader.read(&current)? {
                Value::Null => return self.inner.sync_to_dto(None, dto, ctx),
                next => next.expect_object()?.clone(),
            };
        }
        self.inner.sync_to_dto(Some(&current), dto, ctx)
    }
}
