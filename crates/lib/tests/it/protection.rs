//! Encrypting and decrypting sections

use cfgdoc::{
    ConfigDocument, ProtectionKey, ProtectionState, SectionHandle, SectionKind, section::XValue,
};
use proptest::prelude::*;

use crate::helpers::*;

#[test]
fn test_round_trip_preserves_properties() {
    let mut doc = sample_doc();
    let pages = section_at(&doc, "system.web/pages");
    let key = ProtectionKey::generate();
    let before = doc.render(pages).unwrap();
    let effective_before = effective(&doc, pages);

    doc.encrypt(pages, &key.public_only()).unwrap();
    assert_eq!(doc.protection_state(pages).unwrap(), ProtectionState::Protected);
    let protected = doc.render(pages).unwrap();
    assert!(protected.starts_with(r#"<pages protected="true">"#));
    assert!(!protected.contains("theme"));
    assert!(doc.properties(pages).unwrap_err().is_protected());

    doc.decrypt(pages, &key).unwrap();
    assert_eq!(doc.render(pages).unwrap(), before);
    assert_eq!(effective(&doc, pages), effective_before);
    assert_eq!(doc.properties(pages).unwrap().len().unwrap(), 2);
}

#[test]
fn test_protected_document_survives_reload() {
    let mut doc = sample_doc();
    let pages = section_at(&doc, "system.web/pages");
    let key = ProtectionKey::generate();
    doc.encrypt(pages, &key).unwrap();
    let xml = doc.to_xml().unwrap();

    let mut reloaded = ConfigDocument::parse(&xml).unwrap();
    let pages = section_at(&reloaded, "system.web/pages");
    assert!(reloaded.is_protected(pages).unwrap());
    reloaded.decrypt(pages, &key).unwrap();
    assert_eq!(
        reloaded.properties(pages).unwrap().get_value("theme").unwrap().as_deref(),
        Some("dark")
    );
    assert_eq!(reloaded.to_xml().unwrap(), sample_doc().to_xml().unwrap());
}

#[test]
fn test_key_file_round_trip_decrypts() {
    let (mut doc, section) = doc_with_section("secrets", SectionKind::AppSettings);
    doc.properties_mut(section).unwrap().add("token", Some("abc"), None).unwrap();
    let key = ProtectionKey::generate();
    let public = ProtectionKey::from_json(&key.public_only().to_json().unwrap()).unwrap();
    doc.encrypt(section, &public).unwrap();

    let private = ProtectionKey::from_json(&key.to_json().unwrap()).unwrap();
    doc.decrypt(section, &private).unwrap();
    assert_eq!(effective(&doc, section), vec![("token".to_string(), Some("abc".to_string()))]);
}

#[test]
fn test_state_errors_change_nothing() {
    let mut doc = sample_doc();
    let pages = section_at(&doc, "system.web/pages");
    let key = ProtectionKey::generate();

    assert!(doc.decrypt(pages, &key).unwrap_err().is_invalid_state_transition());
    doc.encrypt(pages, &key).unwrap();
    let xml = doc.to_xml().unwrap();
    assert!(doc.encrypt(pages, &key).unwrap_err().is_invalid_state_transition());
    assert!(doc.decrypt(pages, &key.public_only()).unwrap_err().is_cryptographic_failure());
    assert!(doc.decrypt(pages, &ProtectionKey::generate()).unwrap_err().is_cryptographic_failure());
    assert_eq!(doc.to_xml().unwrap(), xml);
}

#[test]
fn test_tampered_payload() {
    let mut doc = sample_doc();
    let pages = section_at(&doc, "system.web/pages");
    let key = ProtectionKey::generate();
    doc.encrypt(pages, &key).unwrap();

    let xml = doc.to_xml().unwrap();
    let start = xml.find("<CipherValue>").unwrap() + "<CipherValue>".len();
    let mut bytes = xml.into_bytes();
    // Swap one base64 character for another
    bytes[start] = if bytes[start] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    let mut reloaded = ConfigDocument::parse(&tampered).unwrap();
    let pages = section_at(&reloaded, "system.web/pages");
    assert!(reloaded.decrypt(pages, &key).unwrap_err().is_cryptographic_failure());

    let truncated = doc.to_xml().unwrap().replace("<CipherValue>", "<CipherValue>%%");
    let mut reloaded = ConfigDocument::parse(&truncated).unwrap();
    let pages = section_at(&reloaded, "system.web/pages");
    assert!(reloaded.decrypt(pages, &key).unwrap_err().is_cryptographic_failure());
}

#[test]
fn test_native_dictionary_section_and_entry() {
    let mut doc = sample_doc();
    let app = section_at(&doc, "app");
    let db = doc.native(app).unwrap().node_of("db").unwrap().unwrap();
    let key = ProtectionKey::generate();
    let original = doc.native(app).unwrap().value().unwrap();

    doc.encrypt(db, &key).unwrap();
    let tree = doc.native(app).unwrap();
    assert_eq!(tree.get("db").unwrap(), Some(XValue::Protected));
    assert!(tree.child("db").unwrap().unwrap().value().unwrap_err().is_protected());

    // The whole section can be protected on top of the protected entry
    doc.encrypt(app, &key).unwrap();
    assert!(doc.native(app).unwrap_err().is_protected());
    doc.decrypt(app, &key).unwrap();

    // Decrypting rebuilt the children, so the entry has a new handle
    assert!(!doc.dom().contains(db));
    let db = doc.native(app).unwrap().node_of("db").unwrap().unwrap();
    doc.decrypt(db, &key).unwrap();
    assert_eq!(doc.native(app).unwrap().value().unwrap(), original);
}

#[test]
fn test_unprotectable_targets() {
    let mut doc = sample_doc();
    let key = ProtectionKey::generate();
    let notes = section_at(&doc, "notes");
    let web = group_at(&doc, "system.web");
    let app = section_at(&doc, "app");
    let tags = doc.native(app).unwrap().node_of("tags").unwrap().unwrap();

    assert!(doc.encrypt(notes, &key).unwrap_err().is_invalid_argument());
    assert!(doc.encrypt(web, &key).unwrap_err().is_invalid_argument());
    assert!(doc.encrypt(tags, &key).unwrap_err().is_invalid_argument());
    assert!(ProtectionKey::from_public_bytes(&[7u8; 16]).unwrap_err().is_invalid_argument());
}

#[test]
fn test_section_comment_stays_outside_payload() {
    let mut doc = sample_doc();
    let pages = section_at(&doc, "system.web/pages");
    doc.comment_mut(pages).unwrap().set_value(Some("visible")).unwrap();
    let key = ProtectionKey::generate();
    doc.encrypt(pages, &key).unwrap();

    assert_eq!(doc.comment(pages).unwrap().value().unwrap(), "visible");
    assert!(!doc.to_xml().unwrap().contains("theme for every page"));
}

/// Characters that stress escaping, whitespace handling and the XML character set
const AWKWARD: [char; 16] = [
    'a', 'Z', ' ', '\t', '\n', '\r', '&', '<', '>', '"', '\'', ';', '\u{1}', '\u{ffff}', 'é', '😀',
];

fn awkward_text() -> impl Strategy<Value = String> + Clone {
    prop_oneof![
        prop::collection::vec(prop::sample::select(AWKWARD.to_vec()), 0..6)
            .prop_map(String::from_iter),
        prop::sample::select(vec!["&amp;", "]]>", "   ", "\r\n", "<!-- x -->", "--"])
            .prop_map(str::to_string),
    ]
}

#[derive(Debug, Clone)]
enum PropertyOp {
    Add { key: String, value: Option<String>, comment: Option<String> },
    Remove { key: String },
    Clear,
}

fn property_op() -> impl Strategy<Value = PropertyOp> {
    prop_oneof![
        (awkward_text(), prop::option::of(awkward_text()), prop::option::of(awkward_text()))
            .prop_map(|(key, value, comment)| PropertyOp::Add { key, value, comment }),
        awkward_text().prop_map(|key| PropertyOp::Remove { key }),
        Just(PropertyOp::Clear),
    ]
}

fn apply_property_op(doc: &mut ConfigDocument, section: SectionHandle, op: &PropertyOp) {
    let before = doc.to_xml().unwrap();
    let mut props = doc.properties_mut(section).unwrap();
    let result = match op {
        PropertyOp::Add { key, value, comment } => {
            props.add(key, value.as_deref(), comment.as_deref()).map(|_| ())
        }
        PropertyOp::Remove { key } => props.remove(key).map(|_| ()),
        PropertyOp::Clear => props.clear().map(|_| ()),
    };
    if let Err(err) = result {
        assert!(err.is_invalid_argument() || err.is_duplicate_key(), "{op:?} failed with {err}");
        assert_eq!(doc.to_xml().unwrap(), before, "failed {op:?} changed the document");
    }
}

fn native_value() -> impl Strategy<Value = XValue> {
    let leaf = awkward_text().prop_map(XValue::String);
    let list = prop::collection::vec(leaf.clone(), 0..3).prop_map(XValue::List);
    let entry = prop_oneof![3 => leaf, 1 => list];
    let nested = prop::collection::btree_map(awkward_text(), entry.clone(), 0..3)
        .prop_map(|map| XValue::Dictionary(map.into_iter().collect()));
    prop::collection::btree_map(awkward_text(), prop_oneof![3 => entry, 1 => nested], 0..5)
        .prop_map(|map| XValue::Dictionary(map.into_iter().collect()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_property_sets_survive_protection(ops in prop::collection::vec(property_op(), 1..12)) {
        let (mut doc, section) = doc_with_section("secrets", SectionKind::NameValue);
        for op in &ops {
            apply_property_op(&mut doc, section, op);
        }
        let effective_before = effective(&doc, section);
        let len_before = doc.properties(section).unwrap().len().unwrap();
        let render_before = doc.render(section).unwrap();
        let key = ProtectionKey::generate();

        doc.encrypt(section, &key.public_only()).unwrap();
        doc.decrypt(section, &key).unwrap();
        prop_assert_eq!(&effective(&doc, section), &effective_before);
        prop_assert_eq!(doc.properties(section).unwrap().len().unwrap(), len_before);
        prop_assert_eq!(&doc.render(section).unwrap(), &render_before);

        // Also through the serialized form
        doc.encrypt(section, &key).unwrap();
        let mut reloaded = ConfigDocument::parse(&doc.to_xml().unwrap()).unwrap();
        let section = section_at(&reloaded, "secrets");
        reloaded.decrypt(section, &key).unwrap();
        prop_assert_eq!(&effective(&reloaded, section), &effective_before);
        prop_assert_eq!(&reloaded.render(section).unwrap(), &render_before);
    }

    #[test]
    fn test_native_trees_survive_protection(value in native_value()) {
        let (mut doc, section) = doc_with_section("app", SectionKind::XDictionary);
        let before = doc.to_xml().unwrap();
        if let Err(err) = doc.native_mut(section).unwrap().replace(&value) {
            prop_assert!(err.is_invalid_argument(), "{}", err);
            prop_assert_eq!(doc.to_xml().unwrap(), before);
            return Ok(());
        }
        let key = ProtectionKey::generate();

        doc.encrypt(section, &key).unwrap();
        doc.decrypt(section, &key).unwrap();
        prop_assert_eq!(&doc.native(section).unwrap().value().unwrap(), &value);

        doc.encrypt(section, &key).unwrap();
        let mut reloaded = ConfigDocument::parse(&doc.to_xml().unwrap()).unwrap();
        let section = section_at(&reloaded, "app");
        reloaded.decrypt(section, &key).unwrap();
        prop_assert_eq!(&reloaded.native(section).unwrap().value().unwrap(), &value);
    }
}
