use clap::{Parser, Subcommand};
use schemamap::resolver::{XPathMatch, evaluate_first};
use schemamap::{
    Entity, EntityTagInput, LocalEventBus, Mapper, MappingError, MappingRegistry, XmlDocument, XmlNode,
};
use schemamap_xpath1::DataSourceNode;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "schemamap", version, about = "Maps editor entities to and from XML dialects", long_about = None)]
struct Args {
    /// Dialect configuration (JSON) to load
    #[arg(long, short)]
    dialect: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the entity type detected for every element of a document
    Detect { document: PathBuf },
    /// Print the attributes reverse-mapped from the first selected element
    Reverse {
        document: PathBuf,
        #[arg(long = "type")]
        entity_type: String,
        /// XPath evaluated against the document element
        #[arg(long)]
        select: String,
    },
    /// Print the markup placed before and after the selection for an entity
    Forward { entity: PathBuf },
}

fn element_path<'a>(node: XmlNode<'a, 'a>) -> String {
    let mut names = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        if let Some(name) = n.qualified_name() {
            names.push(name);
        }
        current = n.parent();
    }
    names.reverse();
    format!("/{}", names.join("/"))
}

fn main() -> Result<(), MappingError> {
    env_logger::init();
    let args = Args::parse();

    let mut registry = MappingRegistry::new();
    let dialect = registry.register_file(&args.dialect)?;
    let mut mapper = Mapper::new(registry, Arc::new(LocalEventBus::new()));
    mapper.load_mappings(dialect.id().as_str())?;
    log::info!("Loaded dialect '{}'", dialect.id());

    match args.command {
        Command::Detect { document } => {
            let text = fs::read_to_string(document)?;
            let doc = XmlDocument::parse(&text)?;
            for element in doc.elements() {
                if let Some(entity_type) = mapper.get_entity_type_for_tag(EntityTagInput::Node(element)) {
                    println!("{}\t{}", element_path(element), entity_type);
                }
            }
        }
        Command::Reverse {
            document,
            entity_type,
            select,
        } => {
            let text = fs::read_to_string(document)?;
            let doc = XmlDocument::parse(&text)?;
            match evaluate_first(doc.document_element(), &select, dialect.id().as_str()) {
                Some(XPathMatch::Node(node)) => {
                    let attributes = mapper.get_reverse_mapping(node, &entity_type);
                    println!("{}", serde_json::to_string_pretty(&attributes)?);
                }
                _ => log::warn!("'{}' selected no node", select),
            }
        }
        Command::Forward { entity } => {
            let entity: Entity = serde_json::from_str(&fs::read_to_string(entity)?)?;
            let (prefix, suffix) = mapper.get_mapping(&entity);
            println!("{}", serde_json::json!({ "prefix": prefix, "suffix": suffix }));
        }
    }
    Ok(())
}
