// XML datasource implementation using roxmltree
mod serialize;

pub use serialize::to_markup;

use roxmltree::Node;
use schemamap_xpath1::{DataSourceNode, NodeType, QName};
use std::hash::{Hash, Hasher};

/// Wrapper around roxmltree::Document providing data source capabilities
pub struct XmlDocument<'input> {
    doc: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    pub fn parse(text: &'input str) -> Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self { doc })
    }

    pub fn root_node(&self) -> XmlNode<'_, 'input> {
        XmlNode::Element(self.doc.root())
    }

    /// The outermost element of the document.
    pub fn document_element(&self) -> XmlNode<'_, 'input> {
        XmlNode::Element(self.doc.root_element())
    }

    /// Every element of the document in document order.
    pub fn elements(&self) -> impl Iterator<Item = XmlNode<'_, 'input>> + '_ {
        self.doc
            .descendants()
            .filter(|n| n.is_element())
            .map(XmlNode::Element)
    }

    pub fn source(&self) -> &'input str {
        self.doc.input_text()
    }
}

/// Represents either an element/text node or an attribute in the XML tree.
/// Attributes need special handling because roxmltree treats them as data on elements,
/// not as navigable nodes in the tree.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    /// A regular node (element, text, comment, etc.)
    Element(Node<'a, 'input>),
    /// An attribute, represented by its parent element and the attribute index
    Attribute {
        parent: Node<'a, 'input>,
        index: usize,
    },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    pub fn new(node: Node<'a, 'input>) -> Self {
        XmlNode::Element(node)
    }

    pub fn inner(&self) -> Option<Node<'a, 'input>> {
        match self {
            XmlNode::Element(node) => Some(*node),
            XmlNode::Attribute { .. } => None,
        }
    }

    fn attribute(&self) -> Option<roxmltree::Attribute<'a, 'input>> {
        match self {
            XmlNode::Attribute { parent, index } => parent.attributes().nth(*index),
            XmlNode::Element(_) => None,
        }
    }
}

/// roxmltree keeps only the resolved namespace of a name, so the prefix is
/// read back from the markup as written. `markup` starts at the name.
fn written_prefix(markup: &str) -> Option<&str> {
    let end = markup
        .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
        .unwrap_or(markup.len());
    markup[..end].split_once(':').map(|(prefix, _)| prefix)
}

fn element_prefix<'input>(node: Node<'_, 'input>) -> Option<&'input str> {
    let source = node.document().input_text();
    written_prefix(source.get(node.range().start + 1..)?)
}

fn attribute_prefix<'input>(
    parent: Node<'_, 'input>,
    attr: &roxmltree::Attribute<'_, 'input>,
) -> Option<&'input str> {
    let source = parent.document().input_text();
    written_prefix(source.get(attr.range_qname())?)
}

impl<'a, 'input> PartialEq for XmlNode<'a, 'input> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (XmlNode::Element(a), XmlNode::Element(b)) => a.id() == b.id(),
            (
                XmlNode::Attribute {
                    parent: p1,
                    index: i1,
                },
                XmlNode::Attribute {
                    parent: p2,
                    index: i2,
                },
            ) => p1.id() == p2.id() && i1 == i2,
            _ => false,
        }
    }
}

impl<'a, 'input> Eq for XmlNode<'a, 'input> {}

impl<'a, 'input> PartialOrd for XmlNode<'a, 'input> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, 'input> Ord for XmlNode<'a, 'input> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (XmlNode::Element(a), XmlNode::Element(b)) => a.id().get().cmp(&b.id().get()),
            (
                XmlNode::Attribute {
                    parent: p1,
                    index: i1,
                },
                XmlNode::Attribute {
                    parent: p2,
                    index: i2,
                },
            ) => p1.id().get().cmp(&p2.id().get()).then(i1.cmp(i2)),
            // An element sorts before its own attributes, which sort before its children.
            (XmlNode::Element(e), XmlNode::Attribute { parent, .. }) => {
                if e.id() == parent.id() {
                    Ordering::Less
                } else if e.id().get() > parent.id().get() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (XmlNode::Attribute { .. }, XmlNode::Element(_)) => other.cmp(self).reverse(),
        }
    }
}

impl<'a, 'input> Hash for XmlNode<'a, 'input> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            XmlNode::Element(node) => {
                0u8.hash(state);
                node.id().hash(state);
            }
            XmlNode::Attribute { parent, index } => {
                1u8.hash(state);
                parent.id().hash(state);
                index.hash(state);
            }
        }
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a, 'a> {
    fn node_type(&self) -> NodeType {
        match self {
            XmlNode::Element(node) => {
                if node.is_root() {
                    NodeType::Root
                } else if node.is_text() {
                    NodeType::Text
                } else if node.is_comment() {
                    NodeType::Comment
                } else if node.is_pi() {
                    NodeType::ProcessingInstruction
                } else {
                    NodeType::Element
                }
            }
            XmlNode::Attribute { .. } => NodeType::Attribute,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match self {
            XmlNode::Element(node) if node.is_element() => {
                let tag = node.tag_name();
                Some(QName {
                    prefix: tag.namespace().and_then(|_| element_prefix(*node)),
                    local_part: tag.name(),
                })
            }
            XmlNode::Element(node) => node.pi().map(|pi| QName {
                prefix: None,
                local_part: pi.target,
            }),
            XmlNode::Attribute { parent, .. } => self.attribute().map(|attr| QName {
                prefix: attr.namespace().and_then(|_| attribute_prefix(*parent, &attr)),
                local_part: attr.name(),
            }),
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        match self {
            XmlNode::Element(node) if node.is_element() => node.tag_name().namespace(),
            XmlNode::Element(_) => None,
            XmlNode::Attribute { .. } => self.attribute().and_then(|attr| attr.namespace()),
        }
    }

    fn string_value(&self) -> String {
        match self {
            XmlNode::Element(node) => {
                if node.is_element() || node.is_root() {
                    node.descendants()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect()
                } else if node.is_pi() {
                    node.pi()
                        .and_then(|pi| pi.value)
                        .unwrap_or_default()
                        .to_string()
                } else {
                    node.text().unwrap_or_default().to_string()
                }
            }
            XmlNode::Attribute { .. } => self
                .attribute()
                .map(|attr| attr.value().to_string())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Element(node) => {
                let parent = *node;
                let attr_count = node.attributes().len();
                Box::new((0..attr_count).map(move |index| XmlNode::Attribute { parent, index }))
            }
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match self {
            XmlNode::Element(node) => Box::new(node.children().map(XmlNode::Element)),
            XmlNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match self {
            XmlNode::Element(node) => node.parent().map(XmlNode::Element),
            XmlNode::Attribute { parent, .. } => Some(XmlNode::Element(*parent)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemamap_xpath1::XML_NAMESPACE;

    const TEI: &str = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0" xmlns:cw="http://cwrc.ca/ns/cw"><text><p xml:lang="en"><persName ref="#p1" cw:cert="high">Alice</persName> met <placeName>Paris</placeName><!-- checked --></p></text></TEI>"##;

    fn find<'a>(doc: &'a XmlDocument<'a>, local: &str) -> XmlNode<'a, 'a> {
        doc.elements()
            .find(|n| n.name().is_some_and(|q| q.local_part == local))
            .unwrap()
    }

    #[test]
    fn test_element_names_and_namespaces() {
        let doc = XmlDocument::parse(TEI).unwrap();
        let pers = find(&doc, "persName");
        assert_eq!(pers.node_type(), NodeType::Element);
        assert_eq!(pers.qualified_name().as_deref(), Some("persName"));
        assert_eq!(pers.namespace_uri(), Some("http://www.tei-c.org/ns/1.0"));
        assert_eq!(pers.string_value(), "Alice");
    }

    #[test]
    fn test_attribute_prefixes_are_recovered() {
        let doc = XmlDocument::parse(TEI).unwrap();
        let names: Vec<String> = find(&doc, "persName")
            .attributes()
            .filter_map(|a| a.qualified_name())
            .collect();
        assert_eq!(names, vec!["ref", "cw:cert"]);

        let lang = find(&doc, "p").attributes().next().unwrap();
        assert_eq!(lang.qualified_name().as_deref(), Some("xml:lang"));
        assert_eq!(lang.namespace_uri(), Some(XML_NAMESPACE));
        assert_eq!(lang.string_value(), "en");
    }

    #[test]
    fn test_document_order() {
        let doc = XmlDocument::parse(TEI).unwrap();
        let p = find(&doc, "p");
        let pers = find(&doc, "persName");
        let lang = p.attributes().next().unwrap();
        let r#ref = pers.attributes().next().unwrap();
        assert!(p < lang);
        assert!(lang < pers);
        assert!(pers < r#ref);
        assert!(r#ref < find(&doc, "placeName"));
        assert_eq!(lang.parent(), Some(p));
    }

    #[test]
    fn test_node_kinds() {
        let doc = XmlDocument::parse(TEI).unwrap();
        assert_eq!(doc.root_node().node_type(), NodeType::Root);
        let kinds: Vec<NodeType> = find(&doc, "p").children().map(|c| c.node_type()).collect();
        assert_eq!(
            kinds,
            vec![NodeType::Element, NodeType::Text, NodeType::Element, NodeType::Comment]
        );
        assert_eq!(doc.root_node().string_value(), "Alice met Paris");
    }

    #[test]
    fn test_prefixes_follow_the_markup() {
        const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";
        for root in [
            format!(r#"<TEI xmlns:tei="{0}" xmlns="{0}">"#, TEI_NS),
            format!(r#"<TEI xmlns="{0}" xmlns:tei="{0}">"#, TEI_NS),
        ] {
            let text = format!(
                r##"{}<p><persName ref="#p1">A</persName><tei:placeName tei:ref="#pl1">B</tei:placeName></p></TEI>"##,
                root
            );
            let doc = XmlDocument::parse(&text).unwrap();
            let pers = find(&doc, "persName");
            assert_eq!(pers.qualified_name().as_deref(), Some("persName"));
            assert_eq!(pers.namespace_uri(), Some(TEI_NS));

            let place = find(&doc, "placeName");
            assert_eq!(place.qualified_name().as_deref(), Some("tei:placeName"));
            let attr = place.attributes().next().unwrap();
            assert_eq!(attr.qualified_name().as_deref(), Some("tei:ref"));
            assert_eq!(attr.namespace_uri(), Some(TEI_NS));
        }
    }

    #[test]
    fn test_written_prefix() {
        assert_eq!(written_prefix("tei:persName ref=\"x\">"), Some("tei"));
        assert_eq!(written_prefix("persName>"), None);
        assert_eq!(written_prefix("lb/>"), None);
        assert_eq!(written_prefix("xml:lang"), Some("xml"));
    }
}
