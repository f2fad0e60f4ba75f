//! Loading existing documents

use cfgdoc::{ConfigDocument, SectionKind, section::BuiltinSection};

use crate::helpers::*;

#[test]
fn test_sample_loads_and_classifies() {
    let doc = sample_doc();
    doc.check_consistency().unwrap();
    assert!(!doc.is_dirty());

    let pages = section_at(&doc, "system.web/pages");
    assert_eq!(doc.section_kind(pages).unwrap(), SectionKind::NameValue);
    assert_eq!(doc.section_kind(section_at(&doc, "notes")).unwrap(), SectionKind::Text);
    assert_eq!(doc.section_kind(section_at(&doc, "app")).unwrap(), SectionKind::XDictionary);

    let settings = doc.builtin(BuiltinSection::AppSettings).unwrap().unwrap();
    assert_eq!(
        effective(&doc, settings),
        vec![("mode".to_string(), Some("debug".to_string()))]
    );
}

#[test]
fn test_load_render_is_stable() {
    let doc = sample_doc();
    let xml = doc.to_xml().unwrap();
    let again = ConfigDocument::parse(&xml).unwrap();
    assert_eq!(again.to_xml().unwrap(), xml);
}

#[test]
fn test_unknown_and_qualified_handler_types() {
    let doc = ConfigDocument::parse(
        r#"<configuration>
  <configSections>
    <section name="legacy" type="Vendor.Widgets.WidgetSection, Vendor.Widgets, Version=1.0.0.0" />
    <section name="kv" type="System.Configuration.NameValueSectionHandler, System, Version=4.0.0.0, Culture=neutral" />
  </configSections>
  <legacy><add key="size" value="3" /></legacy>
  <kv><add key="a" value="b" /></kv>
</configuration>"#,
    )
    .unwrap();

    let legacy = section_at(&doc, "legacy");
    assert_eq!(doc.section_kind(legacy).unwrap(), SectionKind::Custom);
    assert_eq!(doc.section_kind(section_at(&doc, "kv")).unwrap(), SectionKind::NameValue);

    // The original handler string is kept
    let decl = &doc.declarations().unwrap()[0];
    assert!(decl.handler_type.starts_with("Vendor.Widgets.WidgetSection"));
    assert_eq!(
        doc.properties(legacy).unwrap().get_value("size").unwrap().as_deref(),
        Some("3")
    );
}

#[test]
fn test_foreign_protection_is_unsupported() {
    let xml = r#"<configuration>
  <configSections />
  <connectionStrings configProtectionProvider="RsaProtectedConfigurationProvider">
    <EncryptedData />
  </connectionStrings>
</configuration>"#;
    let err = ConfigDocument::parse(xml).unwrap_err();
    assert!(err.is_unsupported_feature());
    assert!(err.is_load_error());
}

#[test]
fn test_incongruent_documents_are_rejected() {
    let undeclared = "<configuration><configSections /><mystery /></configuration>";
    assert!(ConfigDocument::parse(undeclared).unwrap_err().is_load_error());

    let missing_content = r#"<configuration><configSections>
      <section name="ghost" type="System.Configuration.NameValueSectionHandler" />
    </configSections></configuration>"#;
    assert!(ConfigDocument::parse(missing_content).unwrap_err().is_load_error());

    let duplicated = r#"<configuration><configSections>
      <section name="twice" type="System.Configuration.NameValueSectionHandler" />
      <section name="twice" type="System.Configuration.NameValueSectionHandler" />
    </configSections><twice /></configuration>"#;
    assert!(ConfigDocument::parse(duplicated).unwrap_err().is_load_error());
}

#[test]
fn test_malformed_input() {
    assert!(ConfigDocument::parse("<configuration>").unwrap_err().is_load_error());
    assert!(ConfigDocument::parse("<settings />").unwrap_err().is_load_error());
}

#[test]
fn test_missing_declaration_block_is_created() {
    let mut doc = ConfigDocument::parse("<configuration><appSettings /></configuration>").unwrap();
    let root = doc.root_group();
    doc.add_section(root, "extra", SectionKind::Text).unwrap();
    let xml = doc.to_xml().unwrap();
    assert!(xml.find("<configSections>").unwrap() < xml.find("<appSettings").unwrap());
    doc.check_consistency().unwrap();
}
