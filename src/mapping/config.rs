//! Declarative dialect definitions loaded from JSON.

use super::reverse::FieldMap;
use super::{EntityMappingEntry, MappingDefinition, MappingDefinitionBuilder, ParentTag};
use crate::error::MappingError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The forward mapping keyword that installs the default tag generator.
pub const DEFAULT_MAPPING: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialectConfig {
    pub id: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub id_attribute_name: String,
    #[serde(default)]
    pub block_elements: Vec<String>,
    #[serde(default)]
    pub url_attributes: Vec<String>,
    #[serde(default)]
    pub popup_attributes: Vec<String>,
    #[serde(default)]
    pub popup_elements: Vec<String>,
    #[serde(default)]
    pub entities: IndexMap<String, EntityConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    #[serde(default)]
    pub parent_tag: Option<ParentTag>,
    #[serde(default)]
    pub text_tag: Option<String>,
    #[serde(default)]
    pub xpath_selector: Option<String>,
    #[serde(default)]
    pub is_note: Option<bool>,
    #[serde(default)]
    pub mapping: Option<String>,
    #[serde(default)]
    pub reverse_fields: Option<FieldMap>,
}

impl DialectConfig {
    pub fn from_json_str(json: &str) -> Result<Self, MappingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        log::debug!("Loading dialect configuration from {}", path.display());
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn into_definition(self) -> Result<MappingDefinition, MappingError> {
        Ok(self.into_builder()?.build())
    }

    /// A builder preloaded with this dialect, for hosts that add listeners
    /// or code-defined entity types. Reverse field maps resolve their
    /// prefixes against the dialect id.
    pub fn into_builder(self) -> Result<MappingDefinitionBuilder, MappingError> {
        if self.id.is_empty() {
            return Err(MappingError::InvalidDialect("dialect id is empty".to_string()));
        }
        let mut builder = MappingDefinition::builder(self.id.as_str())
            .header(self.header)
            .id_attribute_name(self.id_attribute_name)
            .block_elements(self.block_elements)
            .url_attributes(self.url_attributes)
            .popup_attributes(self.popup_attributes)
            .popup_elements(self.popup_elements);

        for (entity_type, config) in self.entities {
            let mut entry = EntityMappingEntry::new();
            entry.parent_tag = config.parent_tag;
            entry.text_tag = config.text_tag;
            entry.xpath_selector = config.xpath_selector;
            entry.is_note = config.is_note;
            match config.mapping.as_deref() {
                None => {}
                Some(DEFAULT_MAPPING) => entry = entry.with_default_mapping(),
                Some(other) => {
                    return Err(MappingError::InvalidDialect(format!(
                        "entity '{}' uses unknown mapping '{}'",
                        entity_type, other
                    )));
                }
            }
            if let Some(fields) = config.reverse_fields {
                entry = entry.with_default_reverse_mapping(fields, self.id.as_str());
            }
            builder = builder.entity(entity_type, entry);
        }
        Ok(builder)
    }
}
