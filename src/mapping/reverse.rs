//! Markup to entity attributes.

use super::MappingDefinition;
use crate::resolver::{XPathMatch, evaluate_first};
use crate::xml::{XmlNode, to_markup};
use indexmap::IndexMap;
use schemamap_xpath1::{DataSourceNode, NodeType};
use serde::{Deserialize, Serialize, Serializer};

/// Attribute names the editor manages itself; never reported as domain data.
pub const RESERVED_ATTRIBUTES: [&str; 3] = ["annotationId", "offsetId", "cwrcStructId"];

/// A reverse-mapped value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Group(IndexMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            FieldValue::Group(g) => Some(g),
            _ => None,
        }
    }
}

/// Integral numbers are written without a fraction, as `count(@*)` gives
/// `2` and not `2.0`.
impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Group(group) => group.serialize(serializer),
        }
    }
}

pub type AttributeObject = IndexMap<String, FieldValue>;

/// Where to find one field: an XPath, or a group of named XPaths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    XPath(String),
    Group(IndexMap<String, String>),
}

pub type FieldMap = IndexMap<String, FieldSpec>;

/// The node's own attributes by qualified name, minus the reserved ones.
pub fn attributes_from_xml<'a, N: DataSourceNode<'a>>(node: N) -> IndexMap<String, String> {
    node.attributes()
        .filter_map(|attr| Some((attr.qualified_name()?, attr.string_value())))
        .filter(|(name, _)| !RESERVED_ATTRIBUTES.contains(&name.as_str()))
        .collect()
}

fn value_from_xpath<'a, N: DataSourceNode<'a> + 'a>(node: N, xpath: &str, ns_prefix: &str) -> Option<FieldValue> {
    match evaluate_first(node, xpath, ns_prefix)? {
        XPathMatch::Node(found) => match found.node_type() {
            NodeType::Element => Some(FieldValue::Text(to_markup(found).unwrap_or_else(|e| {
                log::error!("Could not serialize the result of '{}': {}", xpath, e);
                String::new()
            }))),
            NodeType::Text | NodeType::Attribute => Some(FieldValue::Text(found.string_value())),
            _ => None,
        },
        XPathMatch::Text(s) => Some(FieldValue::Text(s)),
        XPathMatch::Number(n) => Some(FieldValue::Number(n)),
        XPathMatch::Boolean(b) => Some(FieldValue::Boolean(b)),
    }
}

/// Resolves every field of `fields` against `node`. Fields that resolve to
/// nothing are left out; groups are always present, possibly empty. The
/// node's own attributes are added under `attributes`.
pub fn get_default_reverse_mapping<'a, N: DataSourceNode<'a> + 'a>(
    node: N,
    fields: &FieldMap,
    ns_prefix: &str,
) -> AttributeObject {
    let mut obj = AttributeObject::new();
    for (key, spec) in fields {
        match spec {
            FieldSpec::XPath(xpath) => {
                if let Some(value) = value_from_xpath(node, xpath, ns_prefix) {
                    obj.insert(key.clone(), value);
                }
            }
            FieldSpec::Group(group) => {
                let resolved = group
                    .iter()
                    .filter_map(|(sub_key, xpath)| {
                        Some((sub_key.clone(), value_from_xpath(node, xpath, ns_prefix)?))
                    })
                    .collect();
                obj.insert(key.clone(), FieldValue::Group(resolved));
            }
        }
    }
    let attributes = attributes_from_xml(node)
        .into_iter()
        .map(|(k, v)| (k, FieldValue::Text(v)))
        .collect();
    obj.insert("attributes".to_string(), FieldValue::Group(attributes));
    obj
}

/// Runs the dialect's reverse mapping for `entity_type`. Types without one
/// yield an empty object.
pub fn get_reverse_mapping(
    definition: &MappingDefinition,
    xml: XmlNode<'_, '_>,
    entity_type: &str,
) -> AttributeObject {
    match definition
        .entity(entity_type)
        .and_then(|entry| entry.reverse_mapping.as_ref())
    {
        Some(reverse) => reverse(xml),
        None => AttributeObject::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::EntityMappingEntry;
    use crate::xml::XmlDocument;
    use schemamap_xpath1::tests::{create_plain_tree, create_test_tree};

    fn fields(json: &str) -> FieldMap {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_attributes_from_xml_drops_reserved_names() {
        let doc = XmlDocument::parse(
            r##"<persName annotationId="a1" offsetId="o1" cwrcStructId="s1" ref="#p1" cert="high"/>"##,
        )
        .unwrap();
        let attrs = attributes_from_xml(doc.document_element());
        let pairs: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, vec![("ref", "#p1"), ("cert", "high")]);
    }

    #[test]
    fn test_default_reverse_mapping_coerces_by_node_kind() {
        let tree = create_test_tree();
        let map = fields(
            r#"{
                "ref": "@ref",
                "name": "text()",
                "lang": "../@xml:lang",
                "certain": "@cert = 'high'",
                "count": "count(@*)",
                "comment": "../comment()",
                "missing": "@key"
            }"#,
        );
        let obj = get_default_reverse_mapping(tree.node(5), &map, "tei");
        assert_eq!(obj["ref"], FieldValue::Text("#p1".to_string()));
        assert_eq!(obj["name"], FieldValue::Text("Alice".to_string()));
        assert_eq!(obj["lang"], FieldValue::Text("en".to_string()));
        assert_eq!(obj["certain"], FieldValue::Boolean(true));
        assert_eq!(obj["count"], FieldValue::Number(2.0));
        assert!(!obj.contains_key("comment"));
        assert!(!obj.contains_key("missing"));

        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ref", "name", "lang", "certain", "count", "attributes"]);
        let attrs = obj["attributes"].as_group().unwrap();
        assert_eq!(attrs["cert"].as_text(), Some("high"));
    }

    #[test]
    fn test_malformed_field_only_drops_itself() {
        let tree = create_test_tree();
        let map = fields(r#"{ "broken": "@@", "ref": "@ref", "unbound": "x:y", "group": { "bad": "((", "cert": "@cert" } }"#);
        let obj = get_default_reverse_mapping(tree.node(5), &map, "tei");

        assert!(!obj.contains_key("broken"));
        assert!(!obj.contains_key("unbound"));
        assert_eq!(obj["ref"].as_text(), Some("#p1"));
        let group = obj["group"].as_group().unwrap();
        assert_eq!(group.keys().map(String::as_str).collect::<Vec<_>>(), vec!["cert"]);
        assert_eq!(obj["attributes"].as_group().unwrap().len(), 2);
    }

    #[test]
    fn test_element_result_is_serialized() {
        let tree = create_test_tree();
        let map = fields(r#"{ "content": "tei:hi" }"#);
        let obj = get_default_reverse_mapping(tree.node(13), &map, "tei");
        assert_eq!(
            obj["content"].as_text(),
            Some(r#"<hi xmlns="http://www.tei-c.org/ns/1.0">twice</hi>"#)
        );
    }

    #[test]
    fn test_groups_are_always_present() {
        let tree = create_plain_tree();
        let map = fields(
            r#"{ "name": { "standard": "@orlando:STANDARD", "reg": "@REG" }, "other": { "x": "@X" } }"#,
        );
        let obj = get_default_reverse_mapping(tree.node(2), &map, "orlando");
        let name = obj["name"].as_group().unwrap();
        assert_eq!(name.len(), 1);
        assert_eq!(name["standard"].as_text(), Some("Woolf, Virginia"));
        assert!(obj["other"].as_group().unwrap().is_empty());
    }

    #[test]
    fn test_get_reverse_mapping_delegates() {
        let def = MappingDefinition::builder("tei")
            .entity(
                "person",
                EntityMappingEntry::new()
                    .with_default_reverse_mapping(fields(r#"{ "ref": "@ref" }"#), "tei"),
            )
            .entity("place", EntityMappingEntry::new().with_parent_tag("placeName"))
            .build();
        let doc = XmlDocument::parse(
            r##"<persName xmlns="http://www.tei-c.org/ns/1.0" ref="#p1">Alice</persName>"##,
        )
        .unwrap();
        let root = doc.document_element();

        let obj = get_reverse_mapping(&def, root, "person");
        assert_eq!(obj["ref"].as_text(), Some("#p1"));
        assert!(get_reverse_mapping(&def, root, "place").is_empty());
        assert!(get_reverse_mapping(&def, root, "unknown").is_empty());
    }

    #[test]
    fn test_attribute_object_serializes_as_plain_json() {
        let mut obj = AttributeObject::new();
        obj.insert("n".to_string(), FieldValue::Number(3.0));
        obj.insert("half".to_string(), FieldValue::Number(0.5));
        obj.insert("nan".to_string(), FieldValue::Number(f64::NAN));
        obj.insert(
            "attributes".to_string(),
            FieldValue::Group(IndexMap::from([("ref".to_string(), FieldValue::Text("#p1".to_string()))])),
        );
        assert_eq!(
            serde_json::to_string(&obj).unwrap(),
            r##"{"n":3,"half":0.5,"nan":null,"attributes":{"ref":"#p1"}}"##
        );
    }
}
