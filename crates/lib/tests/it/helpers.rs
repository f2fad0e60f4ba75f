use std::sync::{Arc, Mutex};

use cfgdoc::{ConfigDocument, GroupHandle, PersistenceSink, Result, SectionHandle, SectionKind};

/// A representative document: a declared group with a NameValue section, a
/// text section, an undeclared built-in and a native dictionary.
pub const SAMPLE_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <configSections>
    <sectionGroup name="system.web" type="System.Configuration.ConfigurationSectionGroup">
      <section name="pages" type="System.Configuration.NameValueSectionHandler" />
    </sectionGroup>
    <section name="notes" type="System.Configuration.IgnoreSectionHandler" />
    <section name="app" type="Cfgdoc.XDictionarySection" />
  </configSections>
  <system.web>
    <pages>
      <!--theme for every page-->
      <add key="theme" value="dark" />
      <add key="layout" value="wide" />
    </pages>
  </system.web>
  <notes>free text</notes>
  <app>
    <string name="name">demo</string>
    <dictionary name="db">
      <string name="host">localhost</string>
      <string name="password">s3cret</string>
    </dictionary>
    <list name="tags">
      <string>a</string>
      <string>b</string>
    </list>
  </app>
  <appSettings>
    <add key="mode" value="debug" />
  </appSettings>
</configuration>
"#;

pub fn sample_doc() -> ConfigDocument {
    ConfigDocument::parse(SAMPLE_CONFIG).unwrap()
}

/// Creates a fresh document holding one section of `kind` named `name` at the root
pub fn doc_with_section(name: &str, kind: SectionKind) -> (ConfigDocument, SectionHandle) {
    let mut doc = ConfigDocument::new();
    let root = doc.root_group();
    let section = doc.add_section(root, name, kind).unwrap();
    (doc, section)
}

/// Looks up a section by `/`-separated path, panicking if it is missing or a group
pub fn section_at(doc: &ConfigDocument, path: &str) -> SectionHandle {
    doc.resolve(&path.parse().unwrap())
        .unwrap()
        .and_then(|node| node.as_section())
        .unwrap_or_else(|| panic!("no section at {path}"))
}

/// Looks up a group by `/`-separated path, panicking if it is missing or a section
pub fn group_at(doc: &ConfigDocument, path: &str) -> GroupHandle {
    doc.resolve(&path.parse().unwrap())
        .unwrap()
        .and_then(|node| node.as_group())
        .unwrap_or_else(|| panic!("no group at {path}"))
}

/// Effective key/value pairs of a property section
pub fn effective(doc: &ConfigDocument, section: SectionHandle) -> Vec<(String, Option<String>)> {
    doc.properties(section).unwrap().effective().unwrap()
}

/// Sink that records every saved document, optionally failing on demand
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub saves: Arc<Mutex<Vec<String>>>,
    pub auto_save: bool,
    pub fail: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn auto() -> Self {
        Self {
            auto_save: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<String> {
        self.saves.lock().unwrap().last().cloned()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl PersistenceSink for RecordingSink {
    fn save(&mut self, xml: &str) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(cfgdoc::persistence::PersistenceError::SaveFailed {
                reason: "sink unavailable".to_string(),
            }
            .into());
        }
        self.saves.lock().unwrap().push(xml.to_string());
        Ok(())
    }

    fn auto_save(&self) -> bool {
        self.auto_save
    }
}
