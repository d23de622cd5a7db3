use crate::error::MappingError;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use schemamap_xpath1::{DataSourceNode, NodeType, XML_NAMESPACE};
use std::io::Write;

/// Serializes a node and its subtree to markup.
///
/// Namespaces used by the subtree but declared outside it are re-declared on
/// the element that first needs them, so the fragment stands on its own.
pub fn to_markup<'a, N: DataSourceNode<'a>>(node: N) -> Result<String, MappingError> {
    if node.node_type() == NodeType::Attribute {
        return Err(MappingError::Serialization(
            "attribute nodes have no markup of their own".to_string(),
        ));
    }
    let mut writer = Writer::new(Vec::new());
    let mut scope = Vec::new();
    write_node(&mut writer, node, &mut scope)
        .map_err(|e| MappingError::Serialization(e.to_string()))?;
    String::from_utf8(writer.into_inner()).map_err(|e| MappingError::Serialization(e.to_string()))
}

/// Declarations emitted so far, innermost last, as (prefix, uri).
type Scope = Vec<(Option<String>, String)>;

fn in_scope<'s>(scope: &'s Scope, prefix: Option<&str>) -> Option<&'s str> {
    scope
        .iter()
        .rev()
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn declare(start: &mut BytesStart, scope: &mut Scope, prefix: Option<&str>, uri: &str) {
    if in_scope(scope, prefix).unwrap_or_default() == uri {
        return;
    }
    let attr = match prefix {
        Some(p) => format!("xmlns:{}", p),
        None => "xmlns".to_string(),
    };
    start.push_attribute((attr.as_str(), uri));
    scope.push((prefix.map(str::to_string), uri.to_string()));
}

fn write_node<'a, N: DataSourceNode<'a>, W: Write>(
    writer: &mut Writer<W>,
    node: N,
    scope: &mut Scope,
) -> std::io::Result<()> {
    match node.node_type() {
        NodeType::Root => {
            for child in node.children() {
                write_node(writer, child, scope)?;
            }
        }
        NodeType::Element => {
            let name = node.qualified_name().unwrap_or_default();
            let mark = scope.len();
            let mut start = BytesStart::new(name.as_str());

            let prefix = node.name().and_then(|q| q.prefix);
            declare(&mut start, scope, prefix, node.namespace_uri().unwrap_or_default());
            for attr in node.attributes() {
                let attr_name = attr.qualified_name().unwrap_or_default();
                if let Some(uri) = attr.namespace_uri().filter(|uri| *uri != XML_NAMESPACE) {
                    declare(&mut start, scope, attr.name().and_then(|q| q.prefix), uri);
                }
                start.push_attribute((attr_name.as_str(), attr.string_value().as_str()));
            }

            let mut children = node.children().peekable();
            if children.peek().is_none() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for child in children {
                    write_node(writer, child, scope)?;
                }
                writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            }
            scope.truncate(mark);
        }
        NodeType::Text => {
            let text = node.string_value();
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text.as_str()))))?;
        }
        NodeType::Comment => {
            writer.write_event(Event::Comment(BytesText::from_escaped(node.string_value())))?;
        }
        NodeType::ProcessingInstruction => {
            let target = node.qualified_name().unwrap_or_default();
            let value = node.string_value();
            let content = if value.is_empty() {
                target
            } else {
                format!("{} {}", target, value)
            };
            writer.write_event(Event::PI(BytesPI::new(content)))?;
        }
        NodeType::Attribute => {}
    }
    Ok(())
}
