// src/error.rs
use thiserror::Error;

/// Errors surfaced by the mapping layer. Everything else degrades to a safe
/// default and is logged instead.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("No mapping set registered under id '{0}'")]
    UnknownMappingSet(String),

    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("XML serialization failed: {0}")]
    Serialization(String),

    #[error("Dialect configuration could not be parsed: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Dialect configuration is invalid: {0}")]
    InvalidDialect(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
