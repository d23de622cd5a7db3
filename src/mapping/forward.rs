//! Entity to markup.

use super::MappingDefinition;
use crate::entity::Entity;
use indexmap::IndexMap;
use quick_xml::escape::escape;

/// Stands for the user's text selection inside a generated fragment.
pub const TEXT_SELECTION: &str = "[[[editorText]]]";

/// ` annotationId="…"` (falling back to the entity id), then
/// ` offsetId="…"` when the range has one.
pub fn range_string(entity: &Entity) -> String {
    let annotation_id = entity
        .range
        .annotation_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(&entity.id);
    let mut out = format!(" annotationId=\"{}\"", escape(annotation_id));
    if let Some(offset_id) = &entity.range.offset_id {
        out.push_str(&format!(" offsetId=\"{}\"", escape(offset_id.as_str())));
    }
    out
}

/// ` key="value"` for every non-empty value, in map order.
pub fn attribute_string(attributes: &IndexMap<String, String>) -> String {
    attributes
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!(" {}=\"{}\"", key, escape(value.as_str())))
        .collect()
}

/// The opening tag with range and domain attributes, left unclosed so that
/// a dialect can append attributes of its own.
pub fn tag_and_default_attributes(entity: &Entity) -> String {
    format!(
        "<{}{}{}",
        entity.tag,
        range_string(entity),
        attribute_string(&entity.attributes)
    )
}

pub fn default_mapping(entity: &Entity) -> String {
    format!(
        "{}>{}</{}>",
        tag_and_default_attributes(entity),
        TEXT_SELECTION,
        entity.tag
    )
}

/// Splits a fragment at the first selection marker. Without a marker the
/// whole fragment is the suffix.
pub fn split(fragment: &str) -> (String, String) {
    match fragment.split_once(TEXT_SELECTION) {
        Some((prefix, suffix)) => (prefix.to_string(), suffix.to_string()),
        None => (String::new(), fragment.to_string()),
    }
}

/// Markup to place before and after the selected text for `entity`.
/// Types without a forward mapping yield a pair of empty strings.
pub fn get_mapping(definition: &MappingDefinition, entity: &Entity) -> (String, String) {
    match definition
        .entity(&entity.entity_type)
        .and_then(|entry| entry.mapping.as_ref())
    {
        Some(mapping) => split(&mapping(entity)),
        None => {
            log::debug!(
                "No forward mapping for entity type '{}' in '{}'",
                entity.entity_type,
                definition.id()
            );
            (String::new(), String::new())
        }
    }
}
