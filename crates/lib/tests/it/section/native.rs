//! Native dictionary, list and string sections

use cfgdoc::{
    SectionKind,
    section::{NativeShape, XValue},
};

use crate::helpers::*;

#[test]
fn test_read_loaded_tree() {
    let doc = sample_doc();
    let app = section_at(&doc, "app");
    let tree = doc.native(app).unwrap();

    assert_eq!(tree.shape(), NativeShape::Dictionary);
    assert_eq!(tree.keys().unwrap(), vec!["name", "db", "tags"]);
    assert_eq!(tree.get("name").unwrap(), Some(XValue::string("demo")));

    let db = tree.child("db").unwrap().unwrap();
    assert_eq!(db.get("host").unwrap().unwrap().as_str(), Some("localhost"));

    let tags = tree.child("tags").unwrap().unwrap();
    assert_eq!(tags.shape(), NativeShape::List);
    assert_eq!(tags.len().unwrap(), 2);
    assert_eq!(tags.item(1).unwrap().unwrap().value().unwrap(), XValue::string("b"));
    assert!(tags.item(2).unwrap().is_none());
}

#[test]
fn test_nested_edits_render_canonically() {
    let (mut doc, section) = doc_with_section("app", SectionKind::XDictionary);
    let mut tree = doc.native_mut(section).unwrap();
    tree.set("name", &XValue::string("demo")).unwrap();
    tree.set("servers", &XValue::List(vec![])).unwrap();
    tree.child_mut("servers").unwrap().push(&XValue::string("one")).unwrap();

    assert_eq!(
        doc.render(section).unwrap(),
        "<app>\n  <string name=\"name\">demo</string>\n  <list name=\"servers\">\n    <string>one</string>\n  </list>\n</app>"
    );
}

#[test]
fn test_set_replaces_in_place_and_keeps_comment() {
    let mut doc = sample_doc();
    let app = section_at(&doc, "app");
    let db = doc.native(app).unwrap().node_of("db").unwrap().unwrap();
    doc.comment_mut(db).unwrap().set_value(Some("database")).unwrap();

    let replacement = XValue::Dictionary(vec![("host".to_string(), XValue::string("db.internal"))]);
    let new_db = doc.native_mut(app).unwrap().set("db", &replacement).unwrap();

    let tree = doc.native(app).unwrap();
    assert_eq!(tree.keys().unwrap(), vec!["name", "db", "tags"]);
    assert_eq!(tree.get("db").unwrap(), Some(replacement));
    assert_eq!(doc.comment(new_db).unwrap().value().unwrap(), "database");
}

#[test]
fn test_remove_entry() {
    let mut doc = sample_doc();
    let app = section_at(&doc, "app");
    let mut tree = doc.native_mut(app).unwrap();
    tree.remove("tags").unwrap();
    assert!(tree.remove("tags").unwrap_err().is_not_found());
    assert_eq!(tree.view().keys().unwrap(), vec!["name", "db"]);
}

#[test]
fn test_string_section() {
    let (mut doc, section) = doc_with_section("banner", SectionKind::XString);
    doc.native_mut(section).unwrap().set_text("hello").unwrap();
    assert_eq!(doc.native(section).unwrap().value().unwrap(), XValue::string("hello"));
    assert!(doc.native(section).unwrap().len().unwrap_err().is_invalid_argument());
}

#[test]
fn test_shape_mismatches() {
    let (mut doc, list) = doc_with_section("items", SectionKind::XList);
    let mut tree = doc.native_mut(list).unwrap();
    assert!(tree.set("x", &XValue::string("y")).unwrap_err().is_invalid_argument());
    assert!(
        tree.replace(&XValue::Dictionary(vec![]))
            .unwrap_err()
            .is_invalid_argument()
    );
    assert!(tree.push(&XValue::Protected).unwrap_err().is_invalid_argument());

    let (doc, props) = doc_with_section("kv", SectionKind::NameValue);
    assert!(doc.native(props).unwrap_err().is_invalid_argument());
}
