//! Comment slots on groups, sections and property entries

use cfgdoc::SectionKind;

use crate::helpers::*;

#[test]
fn test_set_then_clear_leaves_empty_slot() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    doc.comment_mut(section).unwrap().set_value(Some("c")).unwrap();
    doc.comment_mut(section).unwrap().set_value(None).unwrap();

    let slot = doc.comment(section).unwrap();
    assert_eq!(slot.try_value().unwrap(), None);
    assert!(!slot.has_value().unwrap());
    // Clearing an empty slot is a no-op
    doc.comment_mut(section).unwrap().remove().unwrap();
}

#[test]
fn test_comment_precedes_owner_in_output() {
    let mut doc = cfgdoc::ConfigDocument::new();
    let root = doc.root_group();
    let group = doc.add_group(root, "grp").unwrap();
    let section = doc.add_section(group, "inner", SectionKind::Text).unwrap();
    doc.comment_mut(group).unwrap().set_value(Some(" group ")).unwrap();
    doc.comment_mut(section).unwrap().set_value(Some(" section ")).unwrap();

    let xml = doc.to_xml().unwrap();
    assert!(xml.contains("<!-- group -->\n  <grp>\n    <!-- section -->\n    <inner />"));

    // Comments survive a reload and are still attached
    let reloaded = cfgdoc::ConfigDocument::parse(&xml).unwrap();
    let inner = section_at(&reloaded, "grp/inner");
    assert_eq!(reloaded.comment(inner).unwrap().value().unwrap(), " section ");
    reloaded.check_consistency().unwrap();
}

#[test]
fn test_entry_comments() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let node = doc
        .properties_mut(section)
        .unwrap()
        .add("k", Some("v"), Some("first"))
        .unwrap();
    doc.comment_mut(node).unwrap().set_value(Some("second")).unwrap();

    let entry = doc.properties(section).unwrap().get_at(0).unwrap();
    assert_eq!(entry.node, node);
    assert_eq!(entry.comment.as_deref(), Some("second"));
}

#[test]
fn test_comments_do_not_affect_identity() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    doc.comment_mut(section).unwrap().set_value(Some("note")).unwrap();
    let root = doc.root_group();
    assert_eq!(doc.find(root, "settings").unwrap().unwrap().as_section(), Some(section));
    doc.check_consistency().unwrap();
}

#[test]
fn test_removing_section_removes_its_comment() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    doc.comment_mut(section).unwrap().set_value(Some("gone soon")).unwrap();
    let root = doc.root_group();
    doc.remove_section(root, "settings").unwrap();
    assert!(!doc.to_xml().unwrap().contains("gone soon"));
}

#[test]
fn test_invalid_comment_text() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let err = doc.comment_mut(section).unwrap().set_value(Some("trailing-")).unwrap_err();
    assert!(err.is_invalid_argument());
    let err = doc
        .properties_mut(section)
        .unwrap()
        .add("k", None, Some("a--b"))
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(doc.properties(section).unwrap().is_empty().unwrap());
}

#[test]
fn test_missing_comment_is_not_found() {
    let doc = sample_doc();
    let notes = section_at(&doc, "notes");
    assert!(doc.comment(notes).unwrap().value().unwrap_err().is_not_found());
}
