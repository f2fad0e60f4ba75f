//! Property set behaviour across section kinds

use cfgdoc::{SectionKind, section::Directive};

use crate::helpers::*;

#[test]
fn test_clear_resets_effective_values() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("A", Some("1"), None).unwrap();
    props.add("B", Some("2"), None).unwrap();
    props.clear().unwrap();
    props.add("A", Some("3"), None).unwrap();

    let view = doc.properties(section).unwrap();
    assert_eq!(view.get_value("A").unwrap().as_deref(), Some("3"));
    assert!(view.get_value("B").unwrap_err().is_not_found());
    assert_eq!(view.len().unwrap(), 4);
}

#[test]
fn test_duplicate_add_leaves_raw_order() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("a", Some("1"), None).unwrap();
    props.add("b", Some("2"), None).unwrap();
    let before = props.view().entries().unwrap();

    let err = props.add("a", Some("other"), None).unwrap_err();
    assert!(err.is_duplicate_key());
    assert_eq!(props.view().entries().unwrap(), before);
}

#[test]
fn test_remove_then_add_again() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("k", Some("old"), None).unwrap();
    props.remove("k").unwrap();
    assert!(!props.view().contains_key("k").unwrap());
    props.add("k", Some("new"), None).unwrap();

    let view = doc.properties(section).unwrap();
    assert_eq!(view.get_value("k").unwrap().as_deref(), Some("new"));
    let directives: Vec<_> = view.entries().unwrap().iter().map(|e| e.directive).collect();
    assert_eq!(directives, vec![Directive::Add, Directive::Remove, Directive::Add]);
}

#[test]
fn test_effective_order_and_missing_values() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("first", Some("1"), None).unwrap();
    props.add("flag", None, None).unwrap();
    props.add("last", Some("3"), None).unwrap();
    props.remove("first").unwrap();

    let view = doc.properties(section).unwrap();
    assert_eq!(
        view.effective().unwrap(),
        vec![("flag".to_string(), None), ("last".to_string(), Some("3".to_string()))]
    );
    assert_eq!(view.get_value("flag").unwrap(), None);
    assert!(view.get_string("flag").unwrap_err().is_invalid_argument());
}

#[test]
fn test_set_updates_in_place() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let mut props = doc.properties_mut(section).unwrap();
    let node = props.add("mode", Some("debug"), None).unwrap();
    assert_eq!(props.set("mode", Some("release")).unwrap(), node);
    props.set("extra", Some("x")).unwrap();

    let view = doc.properties(section).unwrap();
    assert_eq!(view.len().unwrap(), 2);
    assert_eq!(view.get_value("mode").unwrap().as_deref(), Some("release"));
}

#[test]
fn test_remove_at_takes_comment_along() {
    let (mut doc, section) = doc_with_section("settings", SectionKind::NameValue);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("a", Some("1"), Some("about a")).unwrap();
    props.add("b", Some("2"), None).unwrap();
    props.remove_at(0).unwrap();

    let rendered = doc.render(section).unwrap();
    assert!(!rendered.contains("about a"));
    let view = doc.properties(section).unwrap();
    assert_eq!(view.len().unwrap(), 1);
    assert!(view.get_at(3).unwrap_err().is_invalid_argument());
}

#[test]
fn test_single_tag_only_allows_add() {
    let (mut doc, section) = doc_with_section("tag", SectionKind::SingleTag);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("a", Some("1"), None).unwrap();
    assert!(props.remove("a").unwrap_err().is_invalid_argument());
    assert!(props.clear().unwrap_err().is_invalid_argument());
    assert_eq!(props.view().len().unwrap(), 1);
}

#[test]
fn test_dictionary_keys_ignore_case() {
    let (mut doc, section) = doc_with_section("dict", SectionKind::Dictionary);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("Timeout", Some("30"), None).unwrap();
    assert!(props.add("TIMEOUT", Some("60"), None).unwrap_err().is_duplicate_key());
    assert_eq!(props.view().get_value("timeout").unwrap().as_deref(), Some("30"));

    let (mut doc, section) = doc_with_section("kv", SectionKind::NameValue);
    let mut props = doc.properties_mut(section).unwrap();
    props.add("Timeout", Some("30"), None).unwrap();
    props.add("TIMEOUT", Some("60"), None).unwrap();
    assert!(props.view().get_value("timeout").unwrap_err().is_not_found());
}

#[test]
fn test_property_views_reject_other_kinds() {
    let (doc, text) = doc_with_section("notes", SectionKind::Text);
    assert!(doc.properties(text).unwrap_err().is_invalid_argument());

    let (doc, native) = doc_with_section("tree", SectionKind::XList);
    assert!(doc.properties(native).unwrap_err().is_invalid_argument());
}

#[test]
fn test_loaded_entries_keep_comments() {
    let doc = sample_doc();
    let pages = section_at(&doc, "system.web/pages");
    let view = doc.properties(pages).unwrap();
    let first = view.get_at(0).unwrap();
    assert_eq!(first.key.as_deref(), Some("theme"));
    assert_eq!(first.comment.as_deref(), Some("theme for every page"));
    assert_eq!(view.get_at(1).unwrap().comment, None);
}
