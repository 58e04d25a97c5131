//! Compiles bindings into pipes.

use super::chain::{ChainLink, PipeChain};
use super::{CollectionPipe, DataPipe, MapPipe, Pipe};
use crate::accessor::Synthesizer;
use crate::binding::{Binding, BindingKind};
use crate::capability::MatcherCache;
use crate::config::AssemblerConfig;
use crate::error::{CoreError, CoreResult};
use crate::types::Side;
use graphsync_model::{TypeCatalog, TypeName};

/// Where the final segment of a binding lives.
pub(crate) struct LeafSite<'a> {
    pub binding: &'a Binding,
    pub dto_type: &'a TypeName,
    /// Type owning the final segment.
    pub entity_type: &'a TypeName,
    /// Final segment of the entity path.
    pub entity_field: &'a str,
    /// Index of the final segment, used to pick its entity bean key.
    pub key_index: usize,
}

/// Everything pipe construction reads from the assembler context.
pub(crate) struct PipeBuilder<'a> {
    pub catalog: &'a TypeCatalog,
    pub synthesizer: &'a dyn Synthesizer,
    pub matchers: &'a MatcherCache,
    pub config: &'a AssemblerConfig,
}

impl PipeBuilder<'_> {
    /// Builds the pipe of one binding, validating it against both types.
    pub fn build(
        &self,
        dto_type: &TypeName,
        entity_type: &TypeName,
        binding: &Binding,
    ) -> CoreResult<Box<dyn Pipe>> {
        let path = binding.entity_path();
        let Some((last, hops)) = path.split_last() else {
            return Err(CoreError::invalid_binding(binding.dto_field(), "empty entity path"));
        };
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(CoreError::invalid_binding(
                binding.dto_field(),
                format!("malformed entity path {}", binding.entity_field()),
            ));
        }

        let read_only = binding.is_read_only();
        let mut owner = entity_type.clone();
        let mut links = Vec::with_capacity(hops.len());
        for (index, hop) in hops.iter().enumerate() {
            let reader = self.synthesizer.reader(&owner, hop)?;
            let writer = if read_only {
                None
            } else {
                Some(self.synthesizer.writer(&owner, hop)?)
            };
            let next = reader
                .value_type()
                .object_type()
                .filter(|t| self.catalog.contains(t))
                .cloned()
                .ok_or_else(|| {
                    CoreError::invalid_binding(
                        binding.dto_field(),
                        format!("entity path segment {hop} of {owner} is not a declared object type"),
                    )
                })?;
            let bean_key = binding.entity_key_at(index).map(str::to_string);
            if bean_key.is_none() && !read_only {
                return Err(CoreError::MissingBeanKey {
                    field: binding.dto_field().to_string(),
                    side: Side::Entity,
                });
            }
            links.push(ChainLink {
                field: (*hop).to_string(),
                reader,
                writer,
                bean_key,
            });
            owner = next;
        }

        let site = LeafSite {
            binding,
            dto_type,
            entity_type: &owner,
            entity_field: last,
            key_index: hops.len(),
        };
        let leaf: Box<dyn Pipe> = match binding.kind() {
            BindingKind::Field { .. } => Box::new(DataPipe::build(self, &site)?),
            BindingKind::Collection(spec) => Box::new(CollectionPipe::build(self, &site, spec)?),
            BindingKind::Map(spec) => Box::new(MapPipe::build(self, &site, spec)?),
        };
        if links.is_empty() {
            return Ok(leaf);
        }

        let dto_read = if read_only {
            None
        } else {
            Some(self.synthesizer.reader(dto_type, binding.dto_field())?)
        };
        Ok(Box::new(PipeChain::new(
            binding.dto_field(),
            binding.entity_field(),
            links,
            dto_read,
            leaf,
        )))
    }
}
