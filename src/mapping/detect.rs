//! Which entity type, if any, a tag or element stands for.

use super::MappingDefinition;
use crate::resolver::evaluate_first;
use crate::xml::XmlNode;
use schemamap_xpath1::DataSourceNode;

/// A bare tag name, or an element whose selectors can be evaluated.
#[derive(Debug, Clone, Copy)]
pub enum EntityTagInput<'s, 'a> {
    Tag(&'s str),
    Node(XmlNode<'a, 'a>),
}

impl<'s> From<&'s str> for EntityTagInput<'s, '_> {
    fn from(tag: &'s str) -> Self {
        EntityTagInput::Tag(tag)
    }
}

impl<'a> From<XmlNode<'a, 'a>> for EntityTagInput<'_, 'a> {
    fn from(node: XmlNode<'a, 'a>) -> Self {
        EntityTagInput::Node(node)
    }
}

pub fn get_entity_type_for_tag(definition: &MappingDefinition, input: EntityTagInput<'_, '_>) -> Option<String> {
    match input {
        EntityTagInput::Tag(tag) => detect_entity_type::<XmlNode>(definition, tag, None),
        EntityTagInput::Node(node) => {
            let tag = node.qualified_name().unwrap_or_default();
            detect_entity_type(definition, &tag, Some(node))
        }
    }
}

/// Scans entity types in definition order. A type with an XPath selector is
/// judged by that selector alone when a node is given, and a selector hit
/// ends the scan. Otherwise `tag` is compared with the type's parent tag; a
/// later parent-tag match replaces an earlier one.
pub fn detect_entity_type<'a, N: DataSourceNode<'a> + 'a>(
    definition: &MappingDefinition,
    tag: &str,
    node: Option<N>,
) -> Option<String> {
    let mut result = None;
    for (entity_type, entry) in definition.entities() {
        match (&entry.xpath_selector, node) {
            (Some(selector), Some(node)) => {
                if evaluate_first(node, selector, definition.id().as_str()).is_some() {
                    return Some(entity_type.clone());
                }
            }
            _ => {
                if entry.parent_tag.as_ref().is_some_and(|p| p.matches(tag)) {
                    result = Some(entity_type.clone());
                }
            }
        }
    }
    result
}
