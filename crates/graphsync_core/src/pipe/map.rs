//! Map pipe.

use super::builder::{LeafSite, PipeBuilder};
use super::collection::{check_container, element_keys, is_collection_like};
use super::element::{ElementSync, Reconciled};
use super::{Pipe, SyncContext};
use crate::accessor::{DataReader, DataWriter};
use crate::binding::MapSpec;
use crate::capability::BoundMatcher;
use crate::error::{CoreError, CoreResult};
use crate::factory::{create_collection, create_map};
use crate::types::Side;
use graphsync_model::{ObjectRef, Value, ValueType};
use std::sync::Arc;
use tracing::trace;

/// Shape of the entity side of a map binding.
enum EntityShape {
    /// Map whose values are the elements.
    Values,
    /// Map whose keys are the elements.
    Keys,
    /// Collection whose elements are keyed by one of their fields.
    Collection { map_key: Arc<dyn DataReader> },
}

/// Synchronizes a DTO map with an entity map or collection.
///
/// Entity to DTO builds a fresh DTO map. DTO to entity reconciles the
/// existing entity container in place, pairing elements with the
/// binding's matcher.
pub struct MapPipe {
    dto_field: String,
    entity_field: String,
    dto_map_key: Option<String>,
    entity_container_key: Option<String>,
    shape: EntityShape,
    elements: ElementSync,
    matcher: Option<BoundMatcher>,
    dto_read: Option<Arc<dyn DataReader>>,
    dto_write: Arc<dyn DataWriter>,
    entity_read: Arc<dyn DataReader>,
    entity_write: Option<Arc<dyn DataWriter>>,
}

impl MapPipe {
    pub(crate) fn build(
        builder: &PipeBuilder<'_>,
        site: &LeafSite<'_>,
        spec: &MapSpec,
    ) -> CoreResult<Self> {
        let binding = site.binding;
        let dto_field = binding.dto_field();
        let read_only = binding.is_read_only();
        let synth = builder.synthesizer;
        check_container(site, "map")?;

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

        let incompatible = || CoreError::IncompatibleTypes {
            dto_field: dto_field.to_string(),
            dto_type: dto_write.value_type().to_string(),
            entity_field: site.entity_field.to_string(),
            entity_type: entity_read.value_type().to_string(),
        };
        if !matches!(dto_write.value_type(), ValueType::Map | ValueType::Any) {
            return Err(incompatible());
        }

        let shape = match entity_read.value_type() {
            ValueType::Map | ValueType::Any if spec.entity_collection_map_key.is_none() => {
                if spec.use_entity_map_key {
                    EntityShape::Keys
                } else {
                    EntityShape::Values
                }
            }
            value_type if is_collection_like(value_type) => {
                let field = spec.entity_collection_map_key.as_deref().ok_or_else(|| {
                    CoreError::invalid_binding(
                        dto_field,
                        "entity collection needs entity_collection_map_key",
                    )
                })?;
                let element_type = spec.element_type.as_ref().ok_or_else(|| {
                    CoreError::invalid_binding(
                        dto_field,
                        "entity collection needs an element type to read map keys",
                    )
                })?;
                EntityShape::Collection {
                    map_key: synth.reader(element_type, field)?,
                }
            }
            _ => return Err(incompatible()),
        };

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
            dto_map_key: spec.dto_map_key.clone(),
            entity_container_key: spec.entity_container_key.clone(),
            shape,
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

    fn read_or_create(
        &self,
        entity: &ObjectRef,
        writer: &dyn DataWriter,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<Value> {
        let current = self.entity_read.read(entity)?;
        if !current.is_null() {
            return Ok(current);
        }
        let key = self.entity_container_key.as_deref();
        let created = match self.shape {
            EntityShape::Collection { .. } => Value::Collection(create_collection(
                ctx.factory(),
                key,
                &self.dto_field,
                Side::Entity,
            )?),
            _ => Value::Map(create_map(ctx.factory(), key, &self.dto_field, Side::Entity)?),
        };
        writer.write(entity, created.clone())?;
        Ok(created)
    }
}

impl Pipe for MapPipe {
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

        let entries = match dto_read.read(dto)? {
            Value::Null => Vec::new(),
            other => other.expect_map()?.entries(),
        };
        let target = self.read_or_create(entity, writer.as_ref(), ctx)?;

        let outcome: Reconciled = match &self.shape {
            EntityShape::Collection { .. } => {
                let items: Vec<Value> = entries.into_iter().map(|(_, v)| v).collect();
                self.elements
                    .reconcile_collection(&items, target.expect_collection()?, matcher.as_ref(), ctx)?
            }
            EntityShape::Values => self.elements.reconcile_map_values(
                &entries,
                target.expect_map()?,
                matcher.as_ref(),
                ctx,
            )?,
            EntityShape::Keys => self.elements.reconcile_map_keys(
                &entries,
                target.expect_map()?,
                matcher.as_ref(),
                ctx,
            )?,
        };
        trace!(
            field = %self.entity_field,
            removed = outcome.removed,
            updated = outcome.updated,
            added = outcome.added,
            "reconciled map"
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
        let map = create_map(ctx.factory(), self.dto_map_key.as_deref(), &self.dto_field, Side::Dto)?;
        let source = self.entity_read.read(entity)?;
        if !source.is_null() {
            match &self.shape {
                EntityShape::Collection { map_key } => {
                    for element in source.expect_collection()?.items() {
                        let key = map_key.read(element.expect_object()?)?;
                        map.insert(key, self.elements.to_dto(&element, ctx)?);
                    }
                }
                EntityShape::Values => {
                    for (key, element) in source.expect_map()?.entries() {
                        map.insert(key, self.elements.to_dto(&element, ctx)?);
                    }
                }
                EntityShape::Keys => {
                    for (element, value) in source.expect_map()?.entries() {
                        map.insert(self.elements.to_dto(&element, ctx)?, value);
                    }
                }
            }
        }
        trace!(field = %self.dto_field, len = map.len(), "copied map");
        self.dto_write.write(dto, Value::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AssemblerContext, Binding, BindingRegistry, CoreError, DtoAssembler, FieldMatcher,
        KeyedFactory, MapSpec, MatcherRef, Registry,
    };
    use graphsync_model::{MapRef, ObjectRef, TypeCatalog, TypeModel, Value, ValueType};
    use std::sync::Arc;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new()
            .with(TypeModel::new("Skill").field("name", ValueType::Text))
            .unwrap()
            .with(TypeModel::new("SkillDto").field("name", ValueType::Text))
            .unwrap()
            .with(
                TypeModel::new("Person")
                    .field("skills", ValueType::Map)
                    .field("team", ValueType::Collection),
            )
            .unwrap()
            .with(
                TypeModel::new("PersonDto")
                    .field("skills", ValueType::Map)
                    .field("roster", ValueType::Map),
            )
            .unwrap()
    }

    fn by_name() -> MatcherRef {
        MatcherRef::instance(FieldMatcher::new("name"))
    }

    fn context() -> (Arc<AssemblerContext>, KeyedFactory) {
        let bindings = BindingRegistry::new()
            .bind(
                "PersonDto",
                "Person",
                [
                    Binding::map("skills", MapSpec::new().use_entity_map_key().matcher(by_name()))
                        .dto_bean_key("SkillDto")
                        .entity_bean_key("Skill"),
                    Binding::map(
                        "roster",
                        MapSpec::new()
                            .entity_collection_map_key("name")
                            .element_type("Skill")
                            .matcher(by_name()),
                    )
                    .entity("team")
                    .dto_bean_key("SkillDto")
                    .entity_bean_key("Skill"),
                ],
            )
            .and_then(|b| b.bind("SkillDto", "Skill", [Binding::field("name")]))
            .unwrap();
        let catalog = catalog();
        let factory = KeyedFactory::from_catalog(&catalog, &["Skill", "SkillDto"]);
        (AssemblerContext::new(catalog, bindings), factory)
    }

    fn skill_dto(name: &str) -> ObjectRef {
        ObjectRef::new("SkillDto").with("name", name)
    }

    fn to_entity(dto: &ObjectRef, person: &ObjectRef) {
        let (context, factory) = context();
        context
            .assembler("PersonDto", "Person")
            .unwrap()
            .assemble_entity(dto, &Value::Object(person.clone()), &Registry::new(), &factory)
            .unwrap();
    }

    fn key_names(map: &MapRef) -> Vec<Value> {
        map.entries()
            .iter()
            .map(|(k, _)| k.as_object().unwrap().get("name"))
            .collect()
    }

    #[test]
    fn entity_map_keys_are_reconciled() {
        let person = ObjectRef::new("Person");
        let dto = ObjectRef::new("PersonDto").with(
            "skills",
            MapRef::from_entries([(skill_dto("rust"), 3i64), (skill_dto("go"), 1i64)]),
        );
        to_entity(&dto, &person);

        let skills = person.get("skills");
        let skills = skills.as_map().unwrap();
        assert_eq!(key_names(skills), vec![Value::from("rust"), Value::from("go")]);
        let (rust, level) = skills.entries()[0].clone();
        assert_eq!(level, Value::Integer(3));
        assert_eq!(rust.as_object().unwrap().type_name().as_str(), "Skill");

        dto.set("skills", MapRef::from_entries([(skill_dto("rust"), 5i64)]));
        to_entity(&dto, &person);

        let entries = skills.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].0.same(&rust));
        assert_eq!(entries[0].1, Value::Integer(5));
    }

    #[test]
    fn entity_collection_is_keyed_by_field() {
        let person = ObjectRef::new("Person");
        let dto = ObjectRef::new("PersonDto").with(
            "roster",
            MapRef::from_entries([("a", skill_dto("a")), ("b", skill_dto("b"))]),
        );
        to_entity(&dto, &person);

        let team = person.get("team");
        let team = team.as_collection().unwrap();
        assert_eq!(team.len(), 2);
        let b = team.items()[1].clone();

        dto.set(
            "roster",
            MapRef::from_entries([("b", skill_dto("b")), ("c", skill_dto("c"))]),
        );
        to_entity(&dto, &person);
        let items = team.items();
        assert_eq!(items.len(), 2);
        assert!(items[0].same(&b));

        let (context, factory) = context();
        let out = ObjectRef::new("PersonDto");
        context
            .assembler("PersonDto", "Person")
            .unwrap()
            .assemble_dto(&out, &Value::Object(person), &Registry::new(), &factory)
            .unwrap();
        let roster = out.get("roster");
        let keys: Vec<Value> = roster.as_map().unwrap().entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Value::from("b"), Value::from("c")]);
    }

    #[test]
    fn entity_collection_needs_map_key_field() {
        let bindings = BindingRegistry::new()
            .bind(
                "PersonDto",
                "Person",
                [Binding::map("roster", MapSpec::new().matcher(by_name()))
                    .entity("team")
                    .dto_bean_key("SkillDto")
                    .entity_bean_key("Skill")],
            )
            .unwrap();
        let err = AssemblerContext::new(catalog(), bindings)
            .assembler("PersonDto", "Person")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidBinding { .. }));
    }

    #[test]
    fn writable_map_needs_matcher() {
        let bindings = BindingRegistry::new()
            .bind(
                "PersonDto",
                "Person",
                [Binding::map("skills", MapSpec::new().use_entity_map_key())
                    .dto_bean_key("SkillDto")
                    .entity_bean_key("Skill")],
            )
            .unwrap();
        let err = AssemblerContext::new(catalog(), bindings)
            .assembler("PersonDto", "Person")
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingMatcher { .. }));
    }
}
