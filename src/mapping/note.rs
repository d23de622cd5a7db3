//! Body content of note-like entities.

use super::MappingDefinition;
use crate::entity::Entity;
use crate::xml::XmlDocument;

/// Markup that has been checked to be well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMarkup {
    source: String,
}

impl NoteMarkup {
    pub fn parse(source: &str) -> Result<Self, roxmltree::Error> {
        roxmltree::Document::parse(source)?;
        Ok(Self {
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn document(&self) -> Result<XmlDocument<'_>, roxmltree::Error> {
        XmlDocument::parse(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteContent {
    Text(String),
    Markup(NoteMarkup),
}

impl NoteContent {
    /// The content as a string, whichever form it is in.
    pub fn as_str(&self) -> &str {
        match self {
            NoteContent::Text(s) => s.as_str(),
            NoteContent::Markup(m) => m.source(),
        }
    }
}

pub fn is_entity_type_note(definition: &MappingDefinition, entity_type: &str) -> bool {
    definition
        .entity(entity_type)
        .and_then(|entry| entry.is_note)
        .unwrap_or(false)
}

/// The body of a note-like entity: text when `return_as_string` is set,
/// otherwise parsed markup. Markup that fails to parse comes back as text.
/// Entities of other types have an empty body.
pub fn get_note_content_for_entity(
    definition: &MappingDefinition,
    entity: &Entity,
    return_as_string: bool,
) -> NoteContent {
    let Some(entry) = definition
        .entity(&entity.entity_type)
        .filter(|entry| entry.is_note == Some(true))
    else {
        return NoteContent::Text(String::new());
    };
    if let Some(note_content) = &entry.note_content {
        return note_content(entity, return_as_string);
    }

    let raw = entity.note_content.clone().unwrap_or_default();
    if return_as_string {
        return NoteContent::Text(raw);
    }
    match NoteMarkup::parse(&raw) {
        Ok(markup) => NoteContent::Markup(markup),
        Err(e) => {
            log::warn!("Note content of '{}' is not well-formed XML: {}", entity.id, e);
            NoteContent::Text(raw)
        }
    }
}
