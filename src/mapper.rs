//! The active dialect and its listener lifecycle.

use crate::entity::Entity;
use crate::error::MappingError;
use crate::events::{EventBus, EventHandler};
use crate::mapping::detect::{EntityTagInput, get_entity_type_for_tag};
use crate::mapping::note::{NoteContent, get_note_content_for_entity, is_entity_type_note};
use crate::mapping::reverse::{AttributeObject, get_reverse_mapping};
use crate::mapping::{MappingDefinition, MappingSetId, forward};
use crate::registry::MappingRegistry;
use crate::xml::XmlNode;
use indexmap::IndexSet;
use std::sync::Arc;

/// Routes every mapping call to the loaded dialect, and keeps that dialect's
/// listeners subscribed on the host bus while it is loaded.
pub struct Mapper {
    registry: MappingRegistry,
    bus: Arc<dyn EventBus>,
    current: Option<Arc<MappingDefinition>>,
    subscriptions: Vec<(String, EventHandler)>,
}

impl Mapper {
    pub fn new(registry: MappingRegistry, bus: Arc<dyn EventBus>) -> Self {
        Self {
            registry,
            bus,
            current: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MappingRegistry {
        &mut self.registry
    }

    /// Makes `id` the active dialect. The previous dialect's listeners are
    /// all unsubscribed before the new ones are subscribed. An unknown id
    /// is rejected and leaves the mapper as it was.
    pub fn load_mappings(&mut self, id: &str) -> Result<(), MappingError> {
        let definition = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| MappingError::UnknownMappingSet(id.to_string()))?;

        self.clear_mappings();
        for (event, handler) in definition.listeners() {
            self.bus.subscribe(event, Arc::clone(handler));
            self.subscriptions.push((event.clone(), Arc::clone(handler)));
        }
        log::debug!(
            "Loaded mapping set '{}' with {} listener(s)",
            definition.id(),
            self.subscriptions.len()
        );
        self.current = Some(definition);
        Ok(())
    }

    /// Unsubscribes the active dialect's listeners. The dialect stays
    /// active for mapping calls.
    pub fn clear_mappings(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        log::debug!("Removing {} listener(s)", self.subscriptions.len());
        for (event, handler) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(&event, &handler);
        }
    }

    /// The active definition, or the `empty` one when nothing is loaded.
    pub fn get_mappings(&self) -> &MappingDefinition {
        self.current.as_deref().unwrap_or_else(|| self.registry.empty().as_ref())
    }

    pub fn current_mappings_id(&self) -> Option<&MappingSetId> {
        self.current.as_ref().map(|definition| definition.id())
    }

    pub fn get_mapping(&self, entity: &Entity) -> (String, String) {
        forward::get_mapping(self.get_mappings(), entity)
    }

    pub fn get_reverse_mapping(&self, xml: XmlNode<'_, '_>, entity_type: &str) -> AttributeObject {
        get_reverse_mapping(self.get_mappings(), xml, entity_type)
    }

    pub fn get_entity_type_for_tag<'s, 'a>(&self, input: impl Into<EntityTagInput<'s, 'a>>) -> Option<String> {
        get_entity_type_for_tag(self.get_mappings(), input.into())
    }

    pub fn is_entity_type_note(&self, entity_type: &str) -> bool {
        is_entity_type_note(self.get_mappings(), entity_type)
    }

    pub fn get_note_content_for_entity(&self, entity: &Entity, return_as_string: bool) -> NoteContent {
        get_note_content_for_entity(self.get_mappings(), entity, return_as_string)
    }

    pub fn get_header_tag(&self) -> &str {
        self.get_mappings().header()
    }

    pub fn get_id_attribute_name(&self) -> &str {
        self.get_mappings().id_attribute_name()
    }

    pub fn get_block_level_elements(&self) -> &IndexSet<String> {
        self.get_mappings().block_elements()
    }

    pub fn get_url_attributes(&self) -> &IndexSet<String> {
        self.get_mappings().url_attributes()
    }

    pub fn get_popup_attributes(&self) -> &IndexSet<String> {
        self.get_mappings().popup_attributes()
    }

    pub fn get_popup_elements(&self) -> &IndexSet<String> {
        self.get_mappings().popup_elements()
    }

    /// The tag `entity_type` is written as; the first one if it has several.
    pub fn get_parent_tag(&self, entity_type: &str) -> &str {
        self.get_mappings()
            .entity(entity_type)
            .and_then(|entry| entry.parent_tag.as_ref())
            .map_or("", |tag| tag.first())
    }

    pub fn get_text_tag(&self, entity_type: &str) -> &str {
        self.get_mappings()
            .entity(entity_type)
            .and_then(|entry| entry.text_tag.as_deref())
            .unwrap_or_default()
    }
}

impl Drop for Mapper {
    fn drop(&mut self) {
        self.clear_mappings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LocalEventBus;
    use crate::mapping::EntityMappingEntry;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_handler(counter: &Arc<AtomicUsize>) -> EventHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    struct Fixture {
        bus: Arc<LocalEventBus>,
        orlando_calls: Arc<AtomicUsize>,
        tei_calls: Arc<AtomicUsize>,
        mapper: Mapper,
    }

    fn fixture() -> Fixture {
        let orlando_calls = Arc::new(AtomicUsize::new(0));
        let tei_calls = Arc::new(AtomicUsize::new(0));
        let registry = MappingRegistry::new()
            .with_definition(
                MappingDefinition::builder("tei")
                    .header("teiHeader")
                    .id_attribute_name("xml:id")
                    .block_elements(["p", "div"])
                    .entity(
                        "person",
                        EntityMappingEntry::new().with_parent_tag("persName").with_default_mapping(),
                    )
                    .entity(
                        "date",
                        EntityMappingEntry::new()
                            .with_parent_tag(vec!["date", "dateRange"])
                            .with_text_tag("label"),
                    )
                    .entity("note", EntityMappingEntry::new().with_parent_tag("note").with_is_note(true))
                    .with_listener("tagAdded", counter_handler(&tei_calls))
                    .build(),
            )
            .with_definition(
                MappingDefinition::builder("orlando")
                    .header("ORLANDOHEADER")
                    .entity("person", EntityMappingEntry::new().with_parent_tag("NAME"))
                    .with_listener("tagAdded", counter_handler(&orlando_calls))
                    .with_listener("documentLoaded", counter_handler(&orlando_calls))
                    .build(),
            );
        let bus = Arc::new(LocalEventBus::new());
        let mapper = Mapper::new(registry, Arc::clone(&bus) as Arc<dyn EventBus>);
        Fixture {
            bus,
            orlando_calls,
            tei_calls,
            mapper,
        }
    }

    #[test]
    fn test_nothing_loaded_uses_empty_defaults() {
        let f = fixture();
        assert_eq!(f.mapper.current_mappings_id(), None);
        assert_eq!(f.mapper.get_mappings().id().as_str(), MappingSetId::EMPTY);
        assert_eq!(f.mapper.get_header_tag(), "");
        assert_eq!(f.mapper.get_id_attribute_name(), "");
        assert!(f.mapper.get_block_level_elements().is_empty());
        assert!(f.mapper.get_popup_elements().is_empty());
        assert_eq!(f.mapper.get_parent_tag("person"), "");

        let entity = Entity::new("e1", "person", "persName");
        assert_eq!(f.mapper.get_mapping(&entity), (String::new(), String::new()));
        assert_eq!(f.mapper.get_entity_type_for_tag("persName"), None);
    }

    #[test]
    fn test_switching_dialects_swaps_listeners() {
        let mut f = fixture();
        f.mapper.load_mappings("orlando").unwrap();
        assert_eq!(f.bus.subscriber_count("tagAdded"), 1);
        assert_eq!(f.bus.subscriber_count("documentLoaded"), 1);

        f.mapper.load_mappings("tei").unwrap();
        assert_eq!(f.bus.subscriber_count("tagAdded"), 1);
        assert_eq!(f.bus.subscriber_count("documentLoaded"), 0);

        f.bus.publish("tagAdded", &json!({ "tag": "persName" }));
        assert_eq!(f.tei_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.orlando_calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.mapper.current_mappings_id().map(MappingSetId::as_str), Some("tei"));
    }

    #[test]
    fn test_reloading_does_not_double_subscribe() {
        let mut f = fixture();
        f.mapper.load_mappings("tei").unwrap();
        f.mapper.load_mappings("tei").unwrap();
        assert_eq!(f.bus.subscriber_count("tagAdded"), 1);
    }

    #[test]
    fn test_unknown_id_leaves_state_untouched() {
        let mut f = fixture();
        f.mapper.load_mappings("orlando").unwrap();
        let err = f.mapper.load_mappings("nope").unwrap_err();
        assert!(matches!(err, MappingError::UnknownMappingSet(id) if id == "nope"));
        assert_eq!(f.mapper.current_mappings_id().map(MappingSetId::as_str), Some("orlando"));
        assert_eq!(f.bus.subscriber_count("documentLoaded"), 1);
    }

    #[test]
    fn test_clear_keeps_dialect_but_drops_listeners() {
        let mut f = fixture();
        f.mapper.load_mappings("tei").unwrap();
        f.mapper.clear_mappings();
        assert_eq!(f.bus.subscriber_count("tagAdded"), 0);
        assert_eq!(f.mapper.get_header_tag(), "teiHeader");
    }

    #[test]
    fn test_drop_unsubscribes() {
        let f = fixture();
        let bus = Arc::clone(&f.bus);
        let mut mapper = f.mapper;
        mapper.load_mappings("orlando").unwrap();
        drop(mapper);
        assert_eq!(bus.subscriber_count("tagAdded"), 0);
    }

    #[test]
    fn test_accessors_follow_loaded_dialect() {
        let mut f = fixture();
        f.mapper.load_mappings("tei").unwrap();
        assert_eq!(f.mapper.get_header_tag(), "teiHeader");
        assert_eq!(f.mapper.get_id_attribute_name(), "xml:id");
        assert!(f.mapper.get_block_level_elements().contains("div"));
        assert_eq!(f.mapper.get_parent_tag("date"), "date");
        assert_eq!(f.mapper.get_text_tag("date"), "label");
        assert_eq!(f.mapper.get_text_tag("person"), "");
        assert_eq!(f.mapper.get_parent_tag("unknown"), "");
        assert!(f.mapper.is_entity_type_note("note"));
        assert_eq!(f.mapper.get_entity_type_for_tag("dateRange").as_deref(), Some("date"));

        let entity = Entity::new("e1", "person", "persName")
            .with_annotation_id("ann1")
            .with_attribute("ref", "#p1");
        assert_eq!(
            f.mapper.get_mapping(&entity),
            (
                r##"<persName annotationId="ann1" ref="#p1">"##.to_string(),
                "</persName>".to_string()
            )
        );
        assert_eq!(
            f.mapper.get_note_content_for_entity(&entity, true),
            NoteContent::Text(String::new())
        );

        f.mapper.load_mappings("orlando").unwrap();
        assert_eq!(f.mapper.get_entity_type_for_tag("NAME").as_deref(), Some("person"));
        assert_eq!(f.mapper.get_entity_type_for_tag("persName"), None);
    }
}
