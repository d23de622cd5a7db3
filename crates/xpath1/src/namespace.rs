//! Prefix-to-URI bindings consulted by name tests.

use std::collections::HashMap;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace context of an evaluation. The `xml` prefix is always bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    prefixes: HashMap<String, String>,
}

impl NamespaceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.bind(prefix, uri);
        self
    }

    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), uri.into());
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.prefixes.get(prefix).map(String::as_str)
    }
}
