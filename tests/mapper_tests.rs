mod common;

use common::fixtures::{ORLANDO_DOCUMENT, TEI_DOCUMENT};
use common::{TestResult, element, harness};
use schemamap::{Entity, FieldValue, MappingError, MappingSetId, NoteContent, XmlDocument};
use serde_json::json;

#[test]
fn test_switching_dialects_leaves_no_stale_listeners() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut h = harness()?;

    h.mapper.load_mappings(MappingSetId::ORLANDO)?;
    assert_eq!(h.bus.subscriber_count("tagAdded"), 1);
    assert_eq!(h.bus.subscriber_count("tagRemoved"), 1);

    h.mapper.load_mappings(MappingSetId::TEI)?;
    assert_eq!(h.bus.subscriber_count("tagRemoved"), 0);
    assert_eq!(h.bus.publish("tagAdded", &json!({ "id": "ent_1" })), 1);
    assert_eq!(h.tei_calls.get(), 1);
    assert_eq!(h.orlando_calls.get(), 0);
    Ok(())
}

#[test]
fn test_unknown_dialect_is_rejected() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::TEI)?;

    let result = h.mapper.load_mappings("docbook");
    assert!(matches!(result, Err(MappingError::UnknownMappingSet(ref id)) if id == "docbook"));
    assert_eq!(
        h.mapper.current_mappings_id().map(MappingSetId::as_str),
        Some(MappingSetId::TEI)
    );
    assert_eq!(h.bus.subscriber_count("tagAdded"), 1);
    Ok(())
}

#[test]
fn test_empty_dialect_maps_nothing() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::EMPTY)?;

    let entity = Entity::new("ent_1", "person", "persName");
    assert_eq!(h.mapper.get_mapping(&entity), (String::new(), String::new()));
    assert_eq!(h.mapper.get_entity_type_for_tag("persName"), None);
    assert_eq!(h.mapper.get_header_tag(), "");
    assert!(h.mapper.get_url_attributes().is_empty());
    assert_eq!(h.bus.subscriber_count("tagAdded"), 0);
    Ok(())
}

#[test]
fn test_tei_forward_mapping() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::TEI)?;

    let person = Entity::new("ent_1", "person", "persName")
        .with_annotation_id("ann1")
        .with_attribute("ref", "#p1")
        .with_attribute("cert", "");
    assert_eq!(
        h.mapper.get_mapping(&person),
        (
            r##"<persName annotationId="ann1" ref="#p1">"##.to_string(),
            "</persName>".to_string()
        )
    );

    let date = Entity::new("ent_2", "date", "date")
        .with_offset_id("off2")
        .with_attribute("when", "1901-05-02");
    let (prefix, suffix) = h.mapper.get_mapping(&date);
    assert_eq!(prefix, r#"<date annotationId="ent_2" offsetId="off2" when="1901-05-02">"#);
    assert_eq!(suffix, "</date>");
    Ok(())
}

#[test]
fn test_tei_entity_detection() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::TEI)?;
    let doc = XmlDocument::parse(TEI_DOCUMENT)?;

    let detect = |local: &str, n: usize| h.mapper.get_entity_type_for_tag(element(&doc, local, n));
    assert_eq!(detect("persName", 0).as_deref(), Some("person"));
    assert_eq!(detect("placeName", 0).as_deref(), Some("place"));
    assert_eq!(detect("date", 0).as_deref(), Some("date"));
    assert_eq!(detect("note", 0).as_deref(), Some("note"));
    assert_eq!(detect("note", 1).as_deref(), Some("citation"));
    assert_eq!(detect("ref", 0).as_deref(), Some("link"));
    assert_eq!(detect("p", 0), None);

    // Without a node the selectors cannot run; the last "note" entry wins.
    assert_eq!(h.mapper.get_entity_type_for_tag("note").as_deref(), Some("citation"));
    Ok(())
}

#[test]
fn test_tei_reverse_mapping() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::TEI)?;
    let doc = XmlDocument::parse(TEI_DOCUMENT)?;

    let person = h.mapper.get_reverse_mapping(element(&doc, "persName", 0), "person");
    assert_eq!(person["ref"].as_text(), Some("#p1"));
    assert_eq!(person["name"].as_text(), Some("Alice"));
    assert_eq!(person["certainty"].as_text(), Some("high"));
    let attributes = person["attributes"].as_group().ok_or("no attributes group")?;
    let names: Vec<&str> = attributes.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["ref", "cert"]);

    let date = h.mapper.get_reverse_mapping(element(&doc, "date", 0), "date");
    assert_eq!(date["when"].as_text(), Some("1901-05-02"));
    assert_eq!(date["range"], FieldValue::Group(Default::default()));

    let citation = h.mapper.get_reverse_mapping(element(&doc, "note", 1), "citation");
    assert_eq!(citation["ref"].as_text(), Some("http://example.org/b1"));
    assert_eq!(
        citation["content"].as_text(),
        Some(r#"<bibl xmlns="http://www.tei-c.org/ns/1.0"><ref target="http://example.org/b1">Smith</ref></bibl>"#)
    );

    assert!(h.mapper.get_reverse_mapping(element(&doc, "p", 0), "paragraph").is_empty());
    Ok(())
}

#[test]
fn test_orlando_without_namespace() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::ORLANDO)?;
    let doc = XmlDocument::parse(ORLANDO_DOCUMENT)?;

    let name = element(&doc, "NAME", 0);
    assert_eq!(h.mapper.get_entity_type_for_tag(name).as_deref(), Some("person"));
    assert_eq!(
        h.mapper.get_entity_type_for_tag(element(&doc, "RESEARCHNOTE", 0)).as_deref(),
        Some("note")
    );

    let person = h.mapper.get_reverse_mapping(name, "person");
    let standard = person["name"].as_group().ok_or("no name group")?;
    assert_eq!(standard["standard"].as_text(), Some("Woolf, Virginia"));
    assert!(!standard.contains_key("reg"));
    assert_eq!(person["ref"].as_text(), Some("http://viaf.org/1"));
    assert_eq!(h.mapper.get_parent_tag("date"), "DATE");
    assert_eq!(h.mapper.get_id_attribute_name(), "ID");
    Ok(())
}

#[test]
fn test_note_content() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::TEI)?;

    let note = Entity::new("n1", "note", "note").with_note_content("<note><p>Seen twice</p></note>");
    assert!(h.mapper.is_entity_type_note("note"));
    assert!(matches!(
        h.mapper.get_note_content_for_entity(&note, false),
        NoteContent::Markup(ref m) if m.source() == "<note><p>Seen twice</p></note>"
    ));
    assert_eq!(
        h.mapper.get_note_content_for_entity(&note, true).as_str(),
        "<note><p>Seen twice</p></note>"
    );

    let broken = Entity::new("n2", "note", "note").with_note_content("<note>");
    assert_eq!(
        h.mapper.get_note_content_for_entity(&broken, false),
        NoteContent::Text("<note>".to_string())
    );

    let person = Entity::new("p1", "person", "persName").with_note_content("<p/>");
    assert!(!h.mapper.is_entity_type_note("person"));
    assert_eq!(h.mapper.get_note_content_for_entity(&person, false).as_str(), "");
    Ok(())
}

#[test]
fn test_detection_when_tei_is_bound_twice() -> TestResult {
    let mut h = harness()?;
    h.mapper.load_mappings(MappingSetId::TEI)?;

    let tei = "http://www.tei-c.org/ns/1.0";
    for root in [
        format!(r#"<TEI xmlns:tei="{0}" xmlns="{0}">"#, tei),
        format!(r#"<TEI xmlns="{0}" xmlns:tei="{0}">"#, tei),
    ] {
        let text = format!(
            r##"{}<p><persName ref="#p1">A</persName><note type="citation"><bibl>B</bibl></note></p></TEI>"##,
            root
        );
        let doc = XmlDocument::parse(&text)?;
        let pers = element(&doc, "persName", 0);
        assert_eq!(h.mapper.get_entity_type_for_tag(pers).as_deref(), Some("person"));
        assert_eq!(
            h.mapper.get_entity_type_for_tag(element(&doc, "note", 0)).as_deref(),
            Some("citation")
        );

        let citation = h.mapper.get_reverse_mapping(element(&doc, "note", 0), "citation");
        assert_eq!(
            citation["content"].as_text(),
            Some(r#"<bibl xmlns="http://www.tei-c.org/ns/1.0">B</bibl>"#)
        );
    }
    Ok(())
}
