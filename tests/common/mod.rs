pub mod fixtures;

use schemamap::{
    DialectConfig, EventBus, EventHandler, LocalEventBus, Mapper, MappingDefinition, MappingError,
    MappingRegistry, XmlDocument, XmlNode,
};
use schemamap_xpath1::DataSourceNode;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Path of a dialect document shipped in `dialects/`.
pub fn dialect_path(id: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("dialects")
        .join(format!("{}.json", id))
}

pub fn load_dialect(id: &str) -> Result<MappingDefinition, MappingError> {
    DialectConfig::from_file(dialect_path(id))?.into_definition()
}

/// The `n`th element (in document order) with local name `local`.
pub fn element<'a>(doc: &'a XmlDocument<'a>, local: &str, n: usize) -> XmlNode<'a, 'a> {
    doc.elements()
        .filter(|e| e.name().is_some_and(|q| q.local_part == local))
        .nth(n)
        .unwrap_or_else(|| panic!("no <{}> number {} in fixture", local, n))
}

/// Counts how often the handlers it hands out are called.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn handler(&self) -> EventHandler {
        let count = Arc::clone(&self.0);
        Arc::new(move |_: &Value| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub bus: Arc<LocalEventBus>,
    pub tei_calls: CallCounter,
    pub orlando_calls: CallCounter,
    pub mapper: Mapper,
}

/// A mapper over the shipped dialects. `tei` and `orlando` each get a
/// counting listener on `tagAdded`; `orlando` also on `tagRemoved`.
pub fn harness() -> Result<Harness, MappingError> {
    let tei_calls = CallCounter::default();
    let orlando_calls = CallCounter::default();

    let tei = DialectConfig::from_file(dialect_path("tei"))?
        .into_builder()?
        .with_listener("tagAdded", tei_calls.handler())
        .build();
    let orlando = DialectConfig::from_file(dialect_path("orlando"))?
        .into_builder()?
        .with_listener("tagAdded", orlando_calls.handler())
        .with_listener("tagRemoved", orlando_calls.handler())
        .build();

    let registry = MappingRegistry::new()
        .with_definition(tei)
        .with_definition(orlando)
        .with_definition(load_dialect("cwrcEntry")?);
    let bus = Arc::new(LocalEventBus::new());
    let mapper = Mapper::new(registry, Arc::clone(&bus) as Arc<dyn EventBus>);
    Ok(Harness {
        bus,
        tei_calls,
        orlando_calls,
        mapper,
    })
}
