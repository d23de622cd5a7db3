//! Dialect definitions and the stateless engines that read them.

pub mod config;
pub mod detect;
pub mod forward;
pub mod note;
pub mod reverse;

use crate::entity::Entity;
use crate::events::EventHandler;
use crate::xml::XmlNode;
use indexmap::{IndexMap, IndexSet};
use note::NoteContent;
use reverse::{AttributeObject, FieldMap};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifies a registered dialect, e.g. `tei` or `orlando`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingSetId(String);

impl MappingSetId {
    pub const EMPTY: &'static str = "empty";
    pub const TEI: &'static str = "tei";
    pub const ORLANDO: &'static str = "orlando";
    pub const CWRC_ENTRY: &'static str = "cwrcEntry";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MappingSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MappingSetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MappingSetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The tag (or tags) an entity type is written as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentTag {
    Single(String),
    List(Vec<String>),
}

impl ParentTag {
    pub fn matches(&self, tag: &str) -> bool {
        match self {
            ParentTag::Single(t) => t == tag,
            ParentTag::List(tags) => tags.iter().any(|t| t == tag),
        }
    }

    /// The preferred tag; for a list, its first element.
    pub fn first(&self) -> &str {
        match self {
            ParentTag::Single(t) => t.as_str(),
            ParentTag::List(tags) => tags.first().map(String::as_str).unwrap_or_default(),
        }
    }
}

impl From<&str> for ParentTag {
    fn from(tag: &str) -> Self {
        ParentTag::Single(tag.to_string())
    }
}

impl From<Vec<&str>> for ParentTag {
    fn from(tags: Vec<&str>) -> Self {
        ParentTag::List(tags.into_iter().map(str::to_string).collect())
    }
}

pub type ForwardMapping = Arc<dyn Fn(&Entity) -> String + Send + Sync>;
pub type ReverseMapping = Arc<dyn for<'a> Fn(XmlNode<'a, 'a>) -> AttributeObject + Send + Sync>;
pub type NoteContentFn = Arc<dyn Fn(&Entity, bool) -> NoteContent + Send + Sync>;

/// How one entity type maps to a dialect. Every capability is optional and
/// checked at the point of use.
#[derive(Clone, Default)]
pub struct EntityMappingEntry {
    pub mapping: Option<ForwardMapping>,
    pub reverse_mapping: Option<ReverseMapping>,
    pub parent_tag: Option<ParentTag>,
    pub text_tag: Option<String>,
    pub xpath_selector: Option<String>,
    pub is_note: Option<bool>,
    pub note_content: Option<NoteContentFn>,
}

impl EntityMappingEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping<F>(mut self, mapping: F) -> Self
    where
        F: Fn(&Entity) -> String + Send + Sync + 'static,
    {
        self.mapping = Some(Arc::new(mapping));
        self
    }

    /// Uses [`forward::default_mapping`] as the forward mapping.
    pub fn with_default_mapping(self) -> Self {
        self.with_mapping(forward::default_mapping)
    }

    pub fn with_reverse_mapping<F>(mut self, reverse: F) -> Self
    where
        F: for<'a> Fn(XmlNode<'a, 'a>) -> AttributeObject + Send + Sync + 'static,
    {
        self.reverse_mapping = Some(Arc::new(reverse));
        self
    }

    /// Reverse-maps through [`reverse::get_default_reverse_mapping`] over
    /// `fields`, resolving prefixes against `ns_prefix`.
    pub fn with_default_reverse_mapping(self, fields: FieldMap, ns_prefix: impl Into<String>) -> Self {
        let ns_prefix = ns_prefix.into();
        self.with_reverse_mapping(move |xml| {
            reverse::get_default_reverse_mapping(xml, &fields, &ns_prefix)
        })
    }

    pub fn with_parent_tag(mut self, tag: impl Into<ParentTag>) -> Self {
        self.parent_tag = Some(tag.into());
        self
    }

    pub fn with_text_tag(mut self, tag: impl Into<String>) -> Self {
        self.text_tag = Some(tag.into());
        self
    }

    pub fn with_xpath_selector(mut self, selector: impl Into<String>) -> Self {
        self.xpath_selector = Some(selector.into());
        self
    }

    pub fn with_is_note(mut self, is_note: bool) -> Self {
        self.is_note = Some(is_note);
        self
    }

    pub fn with_note_content<F>(mut self, note_content: F) -> Self
    where
        F: Fn(&Entity, bool) -> NoteContent + Send + Sync + 'static,
    {
        self.note_content = Some(Arc::new(note_content));
        self
    }
}

impl fmt::Debug for EntityMappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMappingEntry")
            .field("mapping", &self.mapping.is_some())
            .field("reverse_mapping", &self.reverse_mapping.is_some())
            .field("parent_tag", &self.parent_tag)
            .field("text_tag", &self.text_tag)
            .field("xpath_selector", &self.xpath_selector)
            .field("is_note", &self.is_note)
            .field("note_content", &self.note_content.is_some())
            .finish()
    }
}

/// Everything the mapper knows about one dialect. Built once, then shared
/// read-only.
pub struct MappingDefinition {
    id: MappingSetId,
    header: String,
    id_attribute_name: String,
    block_elements: IndexSet<String>,
    url_attributes: IndexSet<String>,
    popup_attributes: IndexSet<String>,
    popup_elements: IndexSet<String>,
    entities: IndexMap<String, EntityMappingEntry>,
    listeners: IndexMap<String, EventHandler>,
}

impl MappingDefinition {
    pub fn builder(id: impl Into<MappingSetId>) -> MappingDefinitionBuilder {
        MappingDefinitionBuilder {
            definition: MappingDefinition {
                id: id.into(),
                header: String::new(),
                id_attribute_name: String::new(),
                block_elements: IndexSet::new(),
                url_attributes: IndexSet::new(),
                popup_attributes: IndexSet::new(),
                popup_elements: IndexSet::new(),
                entities: IndexMap::new(),
                listeners: IndexMap::new(),
            },
        }
    }

    /// The definition used when no dialect is loaded: no entities, no
    /// listeners, blank configuration.
    pub fn empty() -> Self {
        Self::builder(MappingSetId::EMPTY).build()
    }

    pub fn id(&self) -> &MappingSetId {
        &self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn id_attribute_name(&self) -> &str {
        &self.id_attribute_name
    }

    pub fn block_elements(&self) -> &IndexSet<String> {
        &self.block_elements
    }

    pub fn url_attributes(&self) -> &IndexSet<String> {
        &self.url_attributes
    }

    pub fn popup_attributes(&self) -> &IndexSet<String> {
        &self.popup_attributes
    }

    pub fn popup_elements(&self) -> &IndexSet<String> {
        &self.popup_elements
    }

    /// Entity types in definition order.
    pub fn entities(&self) -> &IndexMap<String, EntityMappingEntry> {
        &self.entities
    }

    pub fn entity(&self, entity_type: &str) -> Option<&EntityMappingEntry> {
        self.entities.get(entity_type)
    }

    pub fn listeners(&self) -> &IndexMap<String, EventHandler> {
        &self.listeners
    }
}

impl fmt::Debug for MappingDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingDefinition")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("entities", &self.entities)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

pub struct MappingDefinitionBuilder {
    definition: MappingDefinition,
}

impl MappingDefinitionBuilder {
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.definition.header = header.into();
        self
    }

    pub fn id_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.definition.id_attribute_name = name.into();
        self
    }

    pub fn block_elements<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.block_elements = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn url_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.url_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn popup_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.popup_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn popup_elements<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.popup_elements = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an entity type. Types are scanned in the order they are added.
    pub fn entity(mut self, entity_type: impl Into<String>, entry: EntityMappingEntry) -> Self {
        self.definition.entities.insert(entity_type.into(), entry);
        self
    }

    pub fn with_listener(mut self, event: impl Into<String>, handler: EventHandler) -> Self {
        self.definition.listeners.insert(event.into(), handler);
        self
    }

    pub fn build(self) -> MappingDefinition {
        self.definition
    }
}
