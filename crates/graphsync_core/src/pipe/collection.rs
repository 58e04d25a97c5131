//! Collection pipe.

use super::builder::{LeafSite, PipeBuilder};
use super::element::ElementSync;
use super::{Pipe, SyncContext};
use crate::accessor::{DataReader, DataWriter};
use crate::binding::CollectionSpec;
use crate::capability::BoundMatcher;
use crate::error::{CoreError, CoreResult};
use crate::factory::create_collection;
use crate::types::Side;
use graphsync_model::{ObjectRef, Value, ValueType};
use std::sync::Arc;
use tracing::trace;

/// Synchronizes a DTO collection with an entity collection.
///
/// Entity to DTO always builds a fresh DTO collection. DTO to entity
/// reconciles the existing entity collection in place: elements are paired
/// by the binding's matcher, unmatched entity elements are removed, matched
/// ones are updated without being replaced and new ones are appended.
pub struct CollectionPipe {
    dto_field: String,
    entity_field: String,
    dto_collection_key: Option<String>,
    entity_collection_key: Option<String>,
    elements: ElementSync,
    matcher: Option<BoundMatcher>,
    dto_read: Option<Arc<dyn DataReader>>,
    dto_write: Arc<dyn DataWriter>,
    entity_read: Arc<dyn DataReader>,
    entity_write: Option<Arc<dyn DataWriter>>,
}

pub(super) fn is_collection_like(value_type: &ValueType) -> bool {
    matches!(value_type, ValueType::Collection | ValueType::Any)
}

/// Element bean keys of a container binding, checked for consistency.
pub(super) fn element_keys(site: &LeafSite<'_>) -> CoreResult<(Option<String>, Option<String>)> {
    let binding = site.binding;
    let dto_key = binding.dto_key().map(str::to_string);
    let entity_key = binding.entity_key_at(site.key_index).map(str::to_string);
    if dto_key.is_none() && entity_key.is_some() {
        return Err(CoreError::invalid_binding(
            binding.dto_field(),
            "entity element bean key given without a DTO element bean key",
        ));
    }
    if dto_key.is_some() && entity_key.is_none() && !binding.is_read_only() {
        return Err(CoreError::MissingBeanKey {
            field: binding.dto_field().to_string(),
            side: Side::Entity,
        });
    }
    Ok((dto_key, entity_key))
}

/// Checks the parts every container binding shares.
pub(super) fn check_container(site: &LeafSite<'_>, kind: &str) -> CoreResult<()> {
    let binding = site.binding;
    if binding.is_virtual() {
        return Err(CoreError::invalid_binding(
            binding.dto_field(),
            format!("{kind} bindings cannot be virtual"),
        ));
    }
    if binding.converter_key().is_some() {
        return Err(CoreError::invalid_binding(
            binding.dto_field(),
            format!("{kind} bindings do not take converters"),
        ));
    }
    Ok(())
}

impl CollectionPipe {
    pub(crate) fn build(
        builder: &PipeBuilder<'_>,
        site: &LeafSite<'_>,
        spec: &CollectionSpec,
    ) -> CoreResult<Self> {
        let binding = site.binding;
        let dto_field = binding.dto_field();
        let read_only = binding.is_read_only();
        let synth = builder.synthesizer;
        check_container(site, "collection")?;

        let dto_read = if read_only {
            None
        } else {
            Some(synth.reader(site.dto_type, dto_field)?)
        };
        let dto_write = synth.writer(site.dto_type, dto_field)?;
        let entity_read = synth.reader(site.entity_type, site.entity_field)?;
        let entity_write = if read_only {
            None
        } else {
            Some(synth.writer(site.entity_type, site.entity_field)?)
        };

        if !is_collection_like(dto_write.value_type()) || !is_collection_like(entity_read.value_type()) {
            return Err(CoreError::IncompatibleTypes {
                dto_field: dto_field.to_string(),
                dto_type: dto_write.value_type().to_string(),
                entity_field: site.entity_field.to_string(),
                entity_type: entity_read.value_type().to_string(),
            });
        }

        let (dto_key, entity_key) = element_keys(site)?;
        let matcher = match (&spec.matcher, read_only) {
            (Some(matcher), _) => Some(BoundMatcher::bind(matcher, builder.matchers)),
            (None, true) => None,
            (None, false) => {
                return Err(CoreError::MissingMatcher {
                    dto_field: dto_field.to_string(),
                })
            }
        };

        Ok(Self {
            dto_field: dto_field.to_string(),
            entity_field: binding.entity_field().to_string(),
            dto_collection_key: spec.dto_collection_key.clone(),
            entity_collection_key: spec.entity_collection_key.clone(),
            elements: ElementSync {
                dto_field: dto_field.to_string(),
                dto_key,
                entity_key,
                element_type: spec.element_type.clone(),
                element_type_key: spec.element_type_key.clone(),
            },
            matcher,
            dto_read,
            dto_write,
            entity_read,
            entity_write,
        })
    }
}

impl Pipe for CollectionPipe {
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
        let (Some(dto), Some(dto_read), Some(writer), Some(matcher)) =
            (dto, &self.dto_read, &self.entity_write, &self.matcher)
        else {
            return Ok(());
        };
        let matcher = matcher.resolve(ctx.registry(), &self.dto_field, &self.entity_field)?;

        let dto_items = match dto_read.read(dto)? {
            Value::Null => Vec::new(),
            other => other.expect_collection()?.items(),
        };
        let target = match self.entity_read.read(entity)? {
            Value::Null => {
                let created = create_collection(
                    ctx.factory(),
                    self.entity_collection_key.as_deref(),
                    &self.dto_field,
                    Side::Entity,
                )?;
                writer.write(entity, Value::Collection(created.clone()))?;
                created
            }
            other => other.expect_collection()?.clone(),
        };

        let outcome = self
            .elements
            .reconcile_collection(&dto_items, &target, matcher.as_ref(), ctx)?;
        trace!(
            field = %self.entity_field,
            removed = outcome.removed,
            updated = outcome.updated,
            added = outcome.added,
            "reconciled collection"
        );
        Ok(())
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
        let items = create_collection(
            ctx.factory(),
            self.dto_collection_key.as_deref(),
            &self.dto_field,
            Side::Dto,
        )?;
        let source = self.entity_read.read(entity)?;
        if !source.is_null() {
            for element in source.expect_collection()?.items() {
                items.push(self.elements.to_dto(&element, ctx)?);
            }
        }
        trace!(field = %self.dto_field, len = items.len(), "copied collection");
        self.dto_write.write(dto, Value::Collection(items))
    }
}
