//! Assembler construction and caching.

use super::{Assembler, CompositeAssembler, DtoAssembler};
use crate::accessor::{RecordSynthesizer, Synthesizer};
use crate::binding::BindingRegistry;
use crate::capability::MatcherCache;
use crate::config::AssemblerConfig;
use crate::error::{CoreError, CoreResult};
use crate::pipe::PipeBuilder;
use graphsync_model::{ModelError, ObjectRef, TypeCatalog, TypeName};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

type PairKey = (TypeName, TypeName);

/// Builder for [`AssemblerContext`].
pub struct AssemblerContextBuilder {
    catalog: Arc<TypeCatalog>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    bindings: BindingRegistry,
    matchers: Option<Arc<MatcherCache>>,
    config: AssemblerConfig,
}

impl AssemblerContextBuilder {
    /// Replaces the default [`RecordSynthesizer`].
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Sets the binding declarations.
    #[must_use]
    pub fn bindings(mut self, bindings: BindingRegistry) -> Self {
        self.bindings = bindings;
        self
    }

    /// Shares a matcher cache with other contexts.
    #[must_use]
    pub fn matcher_cache(mut self, matchers: Arc<MatcherCache>) -> Self {
        self.matchers = Some(matchers);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the context.
    pub fn build(self) -> Arc<AssemblerContext> {
        let synthesizer = self
            .synthesizer
            .unwrap_or_else(|| Arc::new(RecordSynthesizer::new(self.catalog.clone())));
        Arc::new_cyclic(|this| AssemblerContext {
            catalog: self.catalog,
            synthesizer,
            bindings: self.bindings,
            matchers: self.matchers.unwrap_or_default(),
            config: self.config,
            assemblers: RwLock::new(HashMap::new()),
            this: this.clone(),
        })
    }
}

/// Builds, caches and hands out assemblers.
///
/// Assemblers are built on first request for a `(dto type, entity type)`
/// pair and reused afterwards. Building validates every binding of the
/// pair, so configuration errors surface on first use rather than in the
/// middle of a translation. Concurrent first requests for the same pair
/// agree on one instance.
///
/// # Example
///
/// ```
/// use graphsync_core::{AssemblerContext, Binding, BindingRegistry};
/// use graphsync_model::{TypeCatalog, TypeModel, ValueType};
///
/// let catalog = TypeCatalog::new()
///     .with(TypeModel::new("PersonDto").field("name", ValueType::Text))?
///     .with(TypeModel::new("Person").field("name", ValueType::Text))?;
/// let bindings = BindingRegistry::new()
///     .bind("PersonDto", "Person", [Binding::field("name")])?;
///
/// let context = AssemblerContext::new(catalog, bindings);
/// let assembler = context.assembler("PersonDto", "Person")?;
/// assert_eq!(assembler.bindings(), vec![("name".to_string(), "name".to_string())]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct AssemblerContext {
    catalog: Arc<TypeCatalog>,
    synthesizer: Arc<dyn Synthesizer>,
    bindings: BindingRegistry,
    matchers: Arc<MatcherCache>,
    config: AssemblerConfig,
    assemblers: RwLock<HashMap<PairKey, Arc<Assembler>>>,
    this: Weak<AssemblerContext>,
}

impl AssemblerContext {
    /// Creates a context with the default synthesizer and configuration.
    pub fn new(catalog: TypeCatalog, bindings: BindingRegistry) -> Arc<Self> {
        Self::builder(catalog).bindings(bindings).build()
    }

    /// Starts a builder over `catalog`.
    pub fn builder(catalog: impl Into<Arc<TypeCatalog>>) -> AssemblerContextBuilder {
        AssemblerContextBuilder {
            catalog: catalog.into(),
            synthesizer: None,
            bindings: BindingRegistry::new(),
            matchers: None,
            config: AssemblerConfig::default(),
        }
    }

    /// Declared types.
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Configuration of this context.
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Matcher cache of this context.
    pub fn matcher_cache(&self) -> &Arc<MatcherCache> {
        &self.matchers
    }

    /// Number of cached assemblers.
    pub fn cached_count(&self) -> usize {
        self.assemblers.read().len()
    }

    /// Returns the assembler for a pair, building it on first use.
    ///
    /// A cached assembler that was released on its own is replaced by a
    /// fresh one.
    ///
    /// # Errors
    ///
    /// Fails if either type is undeclared, if no bindings apply to the
    /// pair, or if any binding is invalid for the two types.
    pub fn assembler(
        &self,
        dto_type: impl Into<TypeName>,
        entity_type: impl Into<TypeName>,
    ) -> CoreResult<Arc<Assembler>> {
        let key = (dto_type.into(), entity_type.into());
        if let Some(assembler) = self.assemblers.read().get(&key).filter(|a| !a.is_released()) {
            return Ok(assembler.clone());
        }

        let built = Arc::new(self.build(&key.0, &key.1)?);
        let mut assemblers = self.assemblers.write();
        if let Some(existing) = assemblers.get(&key).filter(|a| !a.is_released()) {
            return Ok(existing.clone());
        }
        debug!(
            dto_type = %built.dto_type(),
            entity_type = %built.entity_type(),
            pipes = built.bindings().len(),
            "built assembler"
        );
        assemblers.insert(key, built.clone());
        Ok(built)
    }

    /// Builds a composite over the given entity types, in order.
    ///
    /// An entity is routed to the first listed type it is an instance of.
    ///
    /// # Errors
    ///
    /// Fails if any of the pair assemblers cannot be built.
    pub fn composite(
        &self,
        dto_type: impl Into<TypeName>,
        entity_types: &[&str],
    ) -> CoreResult<CompositeAssembler> {
        let dto_type = dto_type.into();
        let mut builder = CompositeAssembler::builder(dto_type.clone());
        for &entity_type in entity_types {
            let assembler = self.assembler(dto_type.clone(), entity_type)?;
            let catalog = self.catalog.clone();
            let accepted = TypeName::from(entity_type);
            builder = builder.delegate(
                entity_type,
                move |entity: &ObjectRef| catalog.is_assignable(&accepted, &entity.type_name()),
                assembler,
            );
        }
        Ok(builder.build())
    }

    /// Releases every cached assembler and empties the cache.
    ///
    /// Handles obtained earlier fail from now on; later requests build
    /// fresh assemblers.
    pub fn release_resources(&self) {
        let released: Vec<_> = self.assemblers.write().drain().map(|(_, a)| a).collect();
        for assembler in &released {
            assembler.release_resources();
        }
        debug!(count = released.len(), "released assemblers");
    }

    fn build(&self, dto_type: &TypeName, entity_type: &TypeName) -> CoreResult<Assembler> {
        for type_name in [dto_type, entity_type] {
            if !self.catalog.contains(type_name) {
                return Err(CoreError::Model(ModelError::unknown_type(type_name.as_str())));
            }
        }
        let bindings = self.bindings.lookup(&self.catalog, dto_type, entity_type)?;
        let builder = PipeBuilder {
            catalog: &self.catalog,
            synthesizer: self.synthesizer.as_ref(),
            matchers: &self.matchers,
            config: &self.config,
        };
        let pipes = bindings
            .iter()
            .map(|binding| builder.build(dto_type, entity_type, binding))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Assembler::new(
            dto_type.clone(),
            entity_type.clone(),
            pipes,
            self.this.clone(),
        ))
    }
}

impl fmt::Debug for AssemblerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblerContext")
            .field("types", &self.catalog.len())
            .field("bindings", &self.bindings.len())
            .field("cached", &self.cached_count())
            .field("config", &self.config)
            .finish()
    }
}
