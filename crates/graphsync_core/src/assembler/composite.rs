//! Polymorphic dispatch over several assemblers.

use super::DtoAssembler;
use crate::capability::Registry;
use crate::error::{CoreError, CoreResult};
use crate::factory::{create_object, BeanFactory};
use crate::types::Side;
use graphsync_model::{CollectionRef, ObjectRef, TypeName, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Decides whether a delegate accepts an entity.
pub type EntityPredicate = Arc<dyn Fn(&ObjectRef) -> bool + Send + Sync>;

#[derive(Clone)]
struct Delegate {
    label: TypeName,
    accepts: EntityPredicate,
    assembler: Arc<dyn DtoAssembler>,
}

/// Builds a [`CompositeAssembler`].
pub struct CompositeBuilder {
    dto_type: TypeName,
    delegates: Vec<Delegate>,
}

impl CompositeBuilder {
    /// Adds a delegate. Delegates are tried in the order they are added.
    #[must_use]
    pub fn delegate<F>(
        mut self,
        label: impl Into<TypeName>,
        accepts: F,
        assembler: Arc<dyn DtoAssembler>,
    ) -> Self
    where
        F: Fn(&ObjectRef) -> bool + Send + Sync + 'static,
    {
        self.delegates.push(Delegate {
            label: label.into(),
            accepts: Arc::new(accepts),
            assembler,
        });
        self
    }

    /// Finishes the composite.
    pub fn build(self) -> CompositeAssembler {
        CompositeAssembler {
            dto_type: self.dto_type,
            delegates: RwLock::new(Some(self.delegates.into())),
        }
    }
}

/// Fills one DTO type from entities of several types.
///
/// Each entity goes to the first delegate, in registration order, whose
/// predicate accepts it. When a subtype is registered after its supertype,
/// the supertype's delegate wins. The entity argument may be a collection,
/// in which case every element contributes to the same DTO. Null entities
/// are skipped.
pub struct CompositeAssembler {
    dto_type: TypeName,
    delegates: RwLock<Option<Arc<[Delegate]>>>,
}

impl CompositeAssembler {
    /// Starts a composite for `dto_type`.
    pub fn builder(dto_type: impl Into<TypeName>) -> CompositeBuilder {
        CompositeBuilder {
            dto_type: dto_type.into(),
            delegates: Vec::new(),
        }
    }

    /// Labels of the delegates, in dispatch order.
    pub fn delegates(&self) -> Vec<TypeName> {
        self.delegates
            .read()
            .as_ref()
            .map(|d| d.iter().map(|d| d.label.clone()).collect())
            .unwrap_or_default()
    }

    fn current(&self) -> CoreResult<Arc<[Delegate]>> {
        self.delegates
            .read()
            .clone()
            .ok_or_else(|| CoreError::Released {
                dto_type: self.dto_type.to_string(),
                entity_type: "*".to_string(),
            })
    }

    fn candidates(entity: &Value) -> Vec<Value> {
        match entity {
            Value::Collection(items) => items.items(),
            other => vec![other.clone()],
        }
    }

    /// Runs `apply` once per non-null entity with its selected delegate.
    fn dispatch<F>(&self, entity: &Value, mut apply: F) -> CoreResult<()>
    where
        F: FnMut(&dyn DtoAssembler, &Value) -> CoreResult<()>,
    {
        let delegates = self.current()?;
        for candidate in Self::candidates(entity) {
            let object = match &candidate {
                Value::Null => continue,
                Value::Object(object) => object,
                other => {
                    return Err(CoreError::InvalidInstance {
                        side: Side::Entity,
                        expected: "object".to_string(),
                        actual: other.kind_name().to_string(),
                    })
                }
            };
            let delegate = delegates
                .iter()
                .find(|d| (d.accepts)(object))
                .ok_or_else(|| CoreError::NoMatchingAssembler {
                    dto_type: self.dto_type.to_string(),
                    entity_type: object.type_name().to_string(),
                })?;
            trace!(dto_type = %self.dto_type, delegate = %delegate.label, "composite dispatch");
            apply(delegate.assembler.as_ref(), &candidate)?;
        }
        Ok(())
    }
}

impl DtoAssembler for CompositeAssembler {
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
        self.dispatch(entity, |assembler, entity| {
            assembler.assemble_dto(dto, entity, registry, factory)
        })
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
        for entity in entities.items() {
            let dto = create_object(factory, &self.dto_type, &self.dto_type, Side::Dto)?;
            self.assemble_dto(&dto, &entity, registry, factory)?;
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
        self.dispatch(entity, |assembler, entity| {
            assembler.assemble_entity(dto, entity, registry, factory)
        })
    }

    fn assemble_entities(
        &self,
        _dtos: &CollectionRef,
        _entities: &CollectionRef,
        _registry: &Registry,
        _factory: &dyn BeanFactory,
    ) -> CoreResult<()> {
        Err(CoreError::unsupported(
            "a composite assembler cannot create entities from DTOs",
        ))
    }

    /// Drops the delegate list. The delegates themselves stay usable since
    /// they are shared with the context cache.
    fn release_resources(&self) {
        *self.delegates.write() = None;
    }
}

impl fmt::Debug for CompositeAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeAssembler")
            .field("dto_type", &self.dto_type)
            .field("delegates", &self.delegates())
            .finish()
    }
}
