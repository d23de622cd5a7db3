use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where an entity sits in the editor's document. Both ids end up as
/// reserved attributes on the generated markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_id: Option<String>,
}

/// The editor's annotation model: a typed, attributed span of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub tag: String,
    #[serde(default)]
    pub range: EntityRange,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    /// Raw markup of a note-like entity's body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_content: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation_id(mut self, annotation_id: impl Into<String>) -> Self {
        self.range.annotation_id = Some(annotation_id.into());
        self
    }

    pub fn with_offset_id(mut self, offset_id: impl Into<String>) -> Self {
        self.range.offset_id = Some(offset_id.into());
        self
    }

    pub fn with_note_content(mut self, content: impl Into<String>) -> Self {
        self.note_content = Some(content.into());
        self
    }
}
