//! Element translation and reconciliation shared by collection and map
//! pipes.
//!
//! Elements are structured (objects translated by a nested assembler) when
//! the binding names a DTO bean key, and plain values otherwise.

use super::SyncContext;
use crate::capability::Matcher;
use crate::error::{CoreError, CoreResult};
use crate::factory::{create_object, representation_of};
use crate::types::Side;
use graphsync_model::{CollectionRef, Key, MapRef, ObjectRef, TypeName, Value};
use std::collections::{HashMap, HashSet};

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Reconciled {
    pub removed: usize,
    pub updated: usize,
    pub added: usize,
}

/// How elements of one binding are created and translated.
#[derive(Debug, Clone)]
pub(crate) struct ElementSync {
    pub dto_field: String,
    pub dto_key: Option<String>,
    pub entity_key: Option<String>,
    pub element_type: Option<TypeName>,
    pub element_type_key: Option<String>,
}

impl ElementSync {
    fn structured(&self) -> bool {
        self.dto_key.is_some()
    }

    fn entity_type(&self, element: &ObjectRef, ctx: &SyncContext<'_>) -> CoreResult<TypeName> {
        if let Some(element_type) = &self.element_type {
            return Ok(element_type.clone());
        }
        if let Some(key) = &self.element_type_key {
            return representation_of(ctx.factory(), key, &self.dto_field, Side::Entity);
        }
        Ok(element.type_name())
    }

    /// Translates one entity element into a DTO element.
    pub fn to_dto(&self, element: &Value, ctx: &SyncContext<'_>) -> CoreResult<Value> {
        let Some(dto_key) = &self.dto_key else {
            return Ok(element.clone());
        };
        let entity = match element {
            Value::Null => return Ok(Value::Null),
            other => other.expect_object()?,
        };
        let dto = create_object(ctx.factory(), dto_key, &self.dto_field, Side::Dto)?;
        let assembler = ctx.assembler(&dto.type_name(), &self.entity_type(entity, ctx)?)?;
        assembler.sync_dto(&dto, entity, &ctx.descend()?)?;
        Ok(Value::Object(dto))
    }

    /// Updates a matched entity element in place.
    pub fn update_entity(&self, dto: &Value, entity: &Value, ctx: &SyncContext<'_>) -> CoreResult<()> {
        if !self.structured() {
            return Ok(());
        }
        let dto = dto.expect_object()?;
        let entity = entity.expect_object()?;
        let assembler = ctx.assembler(&dto.type_name(), &self.entity_type(entity, ctx)?)?;
        assembler.sync_entity(dto, entity, &ctx.descend()?)
    }

    /// Creates the entity element for an unmatched DTO element.
    pub fn new_entity(&self, dto: &Value, ctx: &SyncContext<'_>) -> CoreResult<Value> {
        if !self.structured() {
            return Ok(dto.clone());
        }
        let key = self
            .entity_key
            .as_deref()
            .ok_or_else(|| CoreError::MissingBeanKey {
                field: self.dto_field.clone(),
                side: Side::Entity,
            })?;
        let entity = Value::Object(create_object(ctx.factory(), key, &self.dto_field, Side::Entity)?);
        self.update_entity(dto, &entity, ctx)?;
        Ok(entity)
    }

    /// Keys of the non-null DTO elements, with their positions.
    fn dto_keys<'v>(
        &self,
        items: impl Iterator<Item = &'v Value>,
        matcher: &dyn Matcher,
    ) -> CoreResult<(Vec<(Key, usize)>, HashSet<Key>)> {
        let mut keyed = Vec::new();
        let mut wanted = HashSet::new();
        for (index, item) in items.enumerate() {
            if item.is_null() {
                continue;
            }
            let key = matcher.dto_key(item)?;
            wanted.insert(key.clone());
            keyed.push((key, index));
        }
        Ok((keyed, wanted))
    }

    /// Reconciles `target` against DTO elements.
    ///
    /// Unmatched entity elements are removed, matched ones updated in
    /// place and new ones appended. A matched scalar that differs from
    /// its DTO counterpart is replaced and moves to the end.
    pub fn reconcile_collection(
        &self,
        dto_items: &[Value],
        target: &CollectionRef,
        matcher: &dyn Matcher,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<Reconciled> {
        let (keyed, wanted) = self.dto_keys(dto_items.iter(), matcher)?;

        let mut by_key: HashMap<Key, Value> = HashMap::new();
        let mut stale = Vec::new();
        for item in target.items() {
            if item.is_null() {
                stale.push(item);
                continue;
            }
            let key = matcher.entity_key(&item)?;
            if wanted.contains(&key) {
                by_key.entry(key).or_insert(item);
            } else {
                stale.push(item);
            }
        }

        let mut outcome = Reconciled::default();
        if !stale.is_empty() {
            outcome.removed = target.retain(|item| !stale.iter().any(|s| s.same(item)));
        }

        for (key, index) in keyed {
            let dto = &dto_items[index];
            if let Some(existing) = by_key.get(&key).cloned() {
                self.update_entity(dto, &existing, ctx)?;
                if !self.structured() && existing != *dto {
                    target.retain(|item| !item.same(&existing));
                    target.push(dto.clone());
                    by_key.insert(key, dto.clone());
                }
                outcome.updated += 1;
            } else {
                let created = self.new_entity(dto, ctx)?;
                target.push(created.clone());
                by_key.insert(key, created);
                outcome.added += 1;
            }
        }
        Ok(outcome)
    }

    /// Reconciles an entity map whose values are the elements.
    ///
    /// Entries take the DTO map key of the element they match. Re-keyed
    /// entries are taken out before any insert so swapped keys keep both
    /// elements.
    pub fn reconcile_map_values(
        &self,
        dto_entries: &[(Value, Value)],
        target: &MapRef,
        matcher: &dyn Matcher,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<Reconciled> {
        let (keyed, wanted) = self.dto_keys(dto_entries.iter().map(|(_, v)| v), matcher)?;

        let mut by_key: HashMap<Key, (Value, Value)> = HashMap::new();
        let mut stale = Vec::new();
        for (entity_key, item) in target.entries() {
            if item.is_null() {
                stale.push(entity_key);
                continue;
            }
            let key = matcher.entity_key(&item)?;
            if wanted.contains(&key) {
                by_key.entry(key).or_insert((entity_key, item));
            } else {
                stale.push(entity_key);
            }
        }

        let mut outcome = Reconciled::default();
        if !stale.is_empty() {
            outcome.removed = target.retain(|k, _| !stale.iter().any(|s| s.same(k)));
        }

        let moved: Vec<Value> = keyed
            .iter()
            .filter_map(|(key, index)| {
                let (entity_key, _) = by_key.get(key)?;
                (!entity_key.same(&dto_entries[*index].0)).then(|| entity_key.clone())
            })
            .collect();
        if !moved.is_empty() {
            target.retain(|k, _| !moved.iter().any(|m| m.same(k)));
        }

        for (key, index) in keyed {
            let (map_key, dto) = &dto_entries[index];
            if let Some((_, existing)) = by_key.get(&key).cloned() {
                self.update_entity(dto, &existing, ctx)?;
                let value = if self.structured() { existing } else { dto.clone() };
                target.insert(map_key.clone(), value.clone());
                by_key.insert(key, (map_key.clone(), value));
                outcome.updated += 1;
            } else {
                let created = self.new_entity(dto, ctx)?;
                target.insert(map_key.clone(), created.clone());
                by_key.insert(key, (map_key.clone(), created));
                outcome.added += 1;
            }
        }
        Ok(outcome)
    }

    /// Reconciles an entity map whose keys are the elements.
    ///
    /// Values are copied from the DTO map.
    pub fn reconcile_map_keys(
        &self,
        dto_entries: &[(Value, Value)],
        target: &MapRef,
        matcher: &dyn Matcher,
        ctx: &SyncContext<'_>,
    ) -> CoreResult<Reconciled> {
        let (keyed, wanted) = self.dto_keys(dto_entries.iter().map(|(k, _)| k), matcher)?;

        let mut by_key: HashMap<Key, Value> = HashMap::new();
        let mut stale = Vec::new();
        for (item, _) in target.entries() {
            if item.is_null() {
                stale.push(item);
                continue;
            }
            let key = matcher.entity_key(&item)?;
            if wanted.contains(&key) {
                by_key.entry(key).or_insert(item);
            } else {
                stale.push(item);
            }
        }

        let mut outcome = Reconciled::default();
        if !stale.is_empty() {
            outcome.removed = target.retain(|k, _| !stale.iter().any(|s| s.same(k)));
        }

        for (key, index) in keyed {
            let (dto, value) = &dto_entries[index];
            if let Some(existing) = by_key.get(&key) {
                self.update_entity(dto, existing, ctx)?;
                target.insert(existing.clone(), value.clone());
                outcome.updated += 1;
            } else {
                let created = self.new_entity(dto, ctx)?;
                target.insert(created.clone(), value.clone());
                by_key.insert(key, created);
                outcome.added += 1;
            }
        }
        Ok(outcome)
    }
}
