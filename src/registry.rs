//! Dialect definitions known to a mapper, keyed by id.

use crate::error::MappingError;
use crate::mapping::config::DialectConfig;
use crate::mapping::{MappingDefinition, MappingSetId};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// Owns the registered dialects. The `empty` definition is always present
/// and is what a mapper falls back to when nothing is loaded.
#[derive(Debug)]
pub struct MappingRegistry {
    definitions: IndexMap<MappingSetId, Arc<MappingDefinition>>,
    empty: Arc<MappingDefinition>,
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingRegistry {
    pub fn new() -> Self {
        let empty = Arc::new(MappingDefinition::empty());
        let mut definitions = IndexMap::new();
        definitions.insert(empty.id().clone(), Arc::clone(&empty));
        Self { definitions, empty }
    }

    /// Adds a definition under its own id, replacing any earlier one.
    pub fn register(&mut self, definition: MappingDefinition) -> Arc<MappingDefinition> {
        let definition = Arc::new(definition);
        if self
            .definitions
            .insert(definition.id().clone(), Arc::clone(&definition))
            .is_some()
        {
            log::debug!("Replaced mapping set '{}'", definition.id());
        }
        definition
    }

    pub fn with_definition(mut self, definition: MappingDefinition) -> Self {
        self.register(definition);
        self
    }

    /// Registers the dialect described by a JSON configuration file.
    pub fn register_file(&mut self, path: impl AsRef<Path>) -> Result<Arc<MappingDefinition>, MappingError> {
        let definition = DialectConfig::from_file(path)?.into_definition()?;
        Ok(self.register(definition))
    }

    pub fn get(&self, id: &str) -> Option<&Arc<MappingDefinition>> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// Registered ids in registration order, `empty` first.
    pub fn ids(&self) -> impl Iterator<Item = &MappingSetId> {
        self.definitions.keys()
    }

    pub fn empty(&self) -> &Arc<MappingDefinition> {
        &self.empty
    }
}
