//! Text sections

use cfgdoc::SectionKind;

use crate::helpers::*;

#[test]
fn test_same_value_is_not_a_mutation() {
    let mut doc = sample_doc();
    let notes = section_at(&doc, "notes");
    assert_eq!(doc.text(notes).unwrap(), "free text");

    doc.set_text(notes, "free text").unwrap();
    assert!(!doc.is_dirty());

    doc.set_text(notes, "changed").unwrap();
    assert!(doc.is_dirty());
    assert_eq!(doc.text(notes).unwrap(), "changed");
}

#[test]
fn test_empty_text_keeps_section() {
    let (mut doc, notes) = doc_with_section("notes", SectionKind::Text);
    doc.set_text(notes, "some <escaped> & text").unwrap();
    assert!(doc.render(notes).unwrap().contains("&lt;escaped&gt; &amp; text"));

    doc.set_text(notes, "").unwrap();
    assert_eq!(doc.text(notes).unwrap(), "");
    assert_eq!(doc.render(notes).unwrap(), "<notes />");
    assert_eq!(section_at(&doc, "notes"), notes);
}

#[test]
fn test_text_round_trips_through_xml() {
    let (mut doc, notes) = doc_with_section("notes", SectionKind::Text);
    doc.set_text(notes, "  padded value  ").unwrap();
    let reloaded = cfgdoc::ConfigDocument::parse(&doc.to_xml().unwrap()).unwrap();
    assert_eq!(reloaded.text(section_at(&reloaded, "notes")).unwrap(), "  padded value  ");
}

#[test]
fn test_text_on_other_kinds() {
    let (mut doc, section) = doc_with_section("kv", SectionKind::NameValue);
    assert!(doc.text(section).unwrap_err().is_invalid_argument());
    assert!(doc.set_text(section, "x").unwrap_err().is_invalid_argument());
}
