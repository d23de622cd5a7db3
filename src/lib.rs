//! Bidirectional mapping between editor entities and XML markup dialects.
//!
//! A [`Mapper`] holds one active [`MappingDefinition`] taken from a
//! [`MappingRegistry`] and routes forward mapping (entity to markup),
//! reverse mapping (markup to attributes), entity type detection and note
//! content extraction to it.

pub mod entity;
pub mod error;
pub mod events;
pub mod mapper;
pub mod mapping;
pub mod registry;
pub mod resolver;
pub mod xml;

pub use entity::{Entity, EntityRange};
pub use error::MappingError;
pub use events::{EventBus, EventHandler, LocalEventBus};
pub use mapper::Mapper;
pub use mapping::config::DialectConfig;
pub use mapping::detect::EntityTagInput;
pub use mapping::note::{NoteContent, NoteMarkup};
pub use mapping::reverse::{AttributeObject, FieldMap, FieldSpec, FieldValue};
pub use mapping::{EntityMappingEntry, MappingDefinition, MappingSetId, ParentTag};
pub use registry::MappingRegistry;
pub use xml::{XmlDocument, XmlNode};
