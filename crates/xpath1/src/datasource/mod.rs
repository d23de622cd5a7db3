//! Defines the core abstraction for a navigable, read-only XML-like node tree.
use std::hash::Hash;

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

impl QName<'_> {
    /// The name as written in markup, e.g. `tei:persName` or `persName`.
    pub fn qualified(&self) -> String {
        match self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_part),
            None => self.local_part.to_string(),
        }
    }
}

/// The kind of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract every node must satisfy for the XPath engine (and the mapping
/// engines built on top of it) to navigate a document.
///
/// `Ord` must follow document order: a node sorts before its attributes, which
/// sort before its children. Node-set results are returned in that order.
///
/// `'a` is the lifetime of the underlying document.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The kind of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of an element, attribute or processing instruction.
    /// `None` for text, comment and root nodes.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI of an element or attribute, if it has one.
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The XPath string value: text content for text nodes, the concatenated
    /// descendant text for elements and the root, the value for attributes.
    fn string_value(&self) -> String;

    /// The attribute nodes of an element. Empty for every other kind.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The child nodes, in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. `None` only for the root. The parent of an attribute
    /// is the element that owns it.
    fn parent(&self) -> Option<Self>;

    /// Walks up to the document root.
    fn root(&self) -> Self {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// The name as written in the source, `prefix:local` or `local`.
    fn qualified_name(&self) -> Option<String> {
        self.name().map(|q| q.qualified())
    }
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";
    pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

    #[derive(Debug, Clone)]
    struct MockNodeData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        namespace: Option<&'a str>,
        value: String,
        children: Vec<usize>,
        attributes: Vec<usize>,
        parent: Option<usize>,
    }

    /// An arena-backed tree. Node ids are handed out in creation order, so
    /// building a tree top-down (attributes right after their element) yields
    /// ids that follow document order.
    #[derive(Debug)]
    pub struct MockTree<'a> {
        nodes: Vec<MockNodeData<'a>>,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl<'a> MockTree<'a> {
        /// Creates a tree holding only the root node (id 0).
        pub fn new() -> Self {
            Self {
                nodes: vec![MockNodeData {
                    node_type: NodeType::Root,
                    name: None,
                    namespace: None,
                    value: String::new(),
                    children: vec![],
                    attributes: vec![],
                    parent: None,
                }],
            }
        }

        fn push(&mut self, parent: usize, data: MockNodeData<'a>, as_attribute: bool) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNodeData {
                parent: Some(parent),
                ..data
            });
            if as_attribute {
                self.nodes[parent].attributes.push(id);
            } else {
                self.nodes[parent].children.push(id);
            }
            id
        }

        pub fn element(
            &mut self,
            parent: usize,
            prefix: Option<&'a str>,
            local_part: &'a str,
            namespace: Option<&'a str>,
        ) -> usize {
            self.push(
                parent,
                MockNodeData {
                    node_type: NodeType::Element,
                    name: Some(QName { prefix, local_part }),
                    namespace,
                    value: String::new(),
                    children: vec![],
                    attributes: vec![],
                    parent: None,
                },
                false,
            )
        }

        pub fn attribute(
            &mut self,
            owner: usize,
            prefix: Option<&'a str>,
            local_part: &'a str,
            namespace: Option<&'a str>,
            value: &str,
        ) -> usize {
            self.push(
                owner,
                MockNodeData {
                    node_type: NodeType::Attribute,
                    name: Some(QName { prefix, local_part }),
                    namespace,
                    value: value.to_string(),
                    children: vec![],
                    attributes: vec![],
                    parent: None,
                },
                true,
            )
        }

        pub fn text(&mut self, parent: usize, value: &str) -> usize {
            self.leaf(parent, NodeType::Text, value)
        }

        pub fn comment(&mut self, parent: usize, value: &str) -> usize {
            self.leaf(parent, NodeType::Comment, value)
        }

        fn leaf(&mut self, parent: usize, node_type: NodeType, value: &str) -> usize {
            self.push(
                parent,
                MockNodeData {
                    node_type,
                    name: None,
                    namespace: None,
                    value: value.to_string(),
                    children: vec![],
                    attributes: vec![],
                    parent: None,
                },
                false,
            )
        }

        pub fn node(&'a self, id: usize) -> MockNode<'a> {
            MockNode { id, tree: self }
        }
    }

    impl Default for MockTree<'_> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PartialEq for MockNode<'_> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for MockNode<'_> {}

    impl PartialOrd for MockNode<'_> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl Ord for MockNode<'_> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl Hash for MockNode<'_> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.tree.nodes[self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.tree.nodes[self.id].name
        }

        fn namespace_uri(&self) -> Option<&'a str> {
            self.tree.nodes[self.id].namespace
        }

        fn string_value(&self) -> String {
            match self.node_type() {
                NodeType::Root | NodeType::Element => self
                    .children()
                    .filter(|c| matches!(c.node_type(), NodeType::Text | NodeType::Element))
                    .map(|c| c.string_value())
                    .collect(),
                _ => self.tree.nodes[self.id].value.clone(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                tree.nodes[self.id]
                    .attributes
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree;
            Box::new(
                tree.nodes[self.id]
                    .children
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn parent(&self) -> Option<Self> {
            self.tree.nodes[self.id].parent.map(|id| MockNode {
                id,
                tree: self.tree,
            })
        }
    }

    /// Builds a small TEI document:
    ///
    /// ```text
    /// <TEI xmlns="http://www.tei-c.org/ns/1.0">                 1
    ///   <text>                                                  2
    ///     <p xml:lang="en">                                     3, @4
    ///       <persName ref="#p1" cert="high">Alice</persName>    5, @6 @7, text 8
    ///        met                                                9
    ///       <placeName>Paris</placeName>                        10, text 11
    ///       <!-- checked -->                                    12
    ///     </p>
    ///     <note type="researchNote">Seen <hi>twice</hi></note>  13, @14, text 15, 16, text 17
    ///   </text>
    /// </TEI>
    /// ```
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        let ns = Some(TEI_NS);
        let mut tree = MockTree::new();
        let tei = tree.element(0, None, "TEI", ns);
        let text = tree.element(tei, None, "text", ns);
        let p = tree.element(text, None, "p", ns);
        tree.attribute(p, Some("xml"), "lang", Some(XML_NS), "en");
        let pers = tree.element(p, None, "persName", ns);
        tree.attribute(pers, None, "ref", None, "#p1");
        tree.attribute(pers, None, "cert", None, "high");
        tree.text(pers, "Alice");
        tree.text(p, " met ");
        let place = tree.element(p, None, "placeName", ns);
        tree.text(place, "Paris");
        tree.comment(p, " checked ");
        let note = tree.element(text, None, "note", ns);
        tree.attribute(note, None, "type", None, "researchNote");
        tree.text(note, "Seen ");
        let hi = tree.element(note, None, "hi", ns);
        tree.text(hi, "twice");
        tree
    }

    /// The same shape as [`create_test_tree`] without any namespace, as found
    /// in documents saved by editors that drop the default namespace.
    pub fn create_plain_tree<'a>() -> MockTree<'a> {
        let mut tree = MockTree::new();
        let entry = tree.element(0, None, "ENTRY", None);
        let name = tree.element(entry, None, "NAME", None);
        tree.attribute(name, None, "STANDARD", None, "Woolf, Virginia");
        tree.text(name, "Virginia Woolf");
        tree
    }

    #[cfg(test)]
    mod mock_tree_tests {
        use super::*;

        #[test]
        fn ids_follow_document_order() {
            let tree = create_test_tree();
            let pers = tree.node(5);
            let attrs: Vec<_> = pers.attributes().map(|a| a.id).collect();
            assert_eq!(attrs, vec![6, 7]);
            assert_eq!(pers.children().next().map(|c| c.id), Some(8));
            assert!(tree.node(5) < tree.node(6));
        }

        #[test]
        fn string_value_concatenates_descendant_text() {
            let tree = create_test_tree();
            assert_eq!(tree.node(3).string_value(), "Alice met Paris");
            assert_eq!(tree.node(13).string_value(), "Seen twice");
            assert_eq!(tree.node(6).string_value(), "#p1");
        }

        #[test]
        fn root_and_qualified_name() {
            let tree = create_test_tree();
            assert_eq!(tree.node(17).root().id, 0);
            assert_eq!(tree.node(4).qualified_name().as_deref(), Some("xml:lang"));
            assert_eq!(tree.node(5).namespace_uri(), Some(TEI_NS));
        }
    }
}
