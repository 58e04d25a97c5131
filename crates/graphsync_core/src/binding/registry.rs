//! Binding lookup by type pair.

use super::Binding;
use crate::error::{CoreError, CoreResult};
use graphsync_model::{TypeCatalog, TypeName};
use std::collections::{HashMap, HashSet};

/// Bindings declared per DTO type.
///
/// Bindings may target one entity type, or be generic and apply to any
/// entity the DTO is paired with. Lookups for an entity type fall back
/// through its supertypes before using the generic bindings.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    pairs: HashMap<(TypeName, TypeName), Vec<Binding>>,
    generic: HashMap<TypeName, Vec<Binding>>,
}

fn check_unique(
    existing: &[Binding],
    added: &[Binding],
    dto_type: &TypeName,
    entity_type: &str,
) -> CoreResult<()> {
    let mut seen: HashSet<&str> = existing.iter().map(Binding::dto_field).collect();
    for binding in added {
        if !seen.insert(binding.dto_field()) {
            return Err(CoreError::DuplicateBinding {
                dto_type: dto_type.to_string(),
                entity_type: entity_type.to_string(),
                dto_field: binding.dto_field().to_string(),
            });
        }
    }
    Ok(())
}

impl BindingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds bindings for a DTO/entity pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateBinding`] if a DTO field is bound
    /// twice for the pair.
    pub fn register<I>(
        &mut self,
        dto_type: impl Into<TypeName>,
        entity_type: impl Into<TypeName>,
        bindings: I,
    ) -> CoreResult<()>
    where
        I: IntoIterator<Item = Binding>,
    {
        let key = (dto_type.into(), entity_type.into());
        let added: Vec<Binding> = bindings.into_iter().collect();
        let existing = self.pairs.get(&key).map(Vec::as_slice).unwrap_or_default();
        check_unique(existing, &added, &key.0, &key.1)?;
        self.pairs.entry(key).or_default().extend(added);
        Ok(())
    }

    /// Adds bindings that apply to any entity type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateBinding`] if a DTO field is bound
    /// twice.
    pub fn register_generic<I>(&mut self, dto_type: impl Into<TypeName>, bindings: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = Binding>,
    {
        let dto_type = dto_type.into();
        let added: Vec<Binding> = bindings.into_iter().collect();
        let existing = self.generic.get(&dto_type).map(Vec::as_slice).unwrap_or_default();
        check_unique(existing, &added, &dto_type, "*")?;
        self.generic.entry(dto_type).or_default().extend(added);
        Ok(())
    }

    /// Adds bindings for a pair, builder style.
    ///
    /// # Errors
    ///
    /// See [`BindingRegistry::register`].
    pub fn bind<I>(
        mut self,
        dto_type: impl Into<TypeName>,
        entity_type: impl Into<TypeName>,
        bindings: I,
    ) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Binding>,
    {
        self.register(dto_type, entity_type, bindings)?;
        Ok(self)
    }

    /// Adds generic bindings, builder style.
    ///
    /// # Errors
    ///
    /// See [`BindingRegistry::register_generic`].
    pub fn bind_generic<I>(mut self, dto_type: impl Into<TypeName>, bindings: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = Binding>,
    {
        self.register_generic(dto_type, bindings)?;
        Ok(self)
    }

    /// Finds the bindings for a pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BindingsNotFound`] if neither the entity type,
    /// its supertypes nor the generic bindings apply.
    pub fn lookup(
        &self,
        catalog: &TypeCatalog,
        dto_type: &TypeName,
        entity_type: &TypeName,
    ) -> CoreResult<&[Binding]> {
        for candidate in catalog.lineage(entity_type) {
            if let Some(bindings) = self.pairs.get(&(dto_type.clone(), candidate)) {
                return Ok(bindings);
            }
        }
        self.generic
            .get(dto_type)
            .map(Vec::as_slice)
            .ok_or_else(|| CoreError::BindingsNotFound {
                dto_type: dto_type.to_string(),
                entity_type: entity_type.to_string(),
            })
    }

    /// Number of registered pairs and generic DTO types.
    pub fn len(&self) -> usize {
        self.pairs.len() + self.generic.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.generic.is_empty()
    }
}
