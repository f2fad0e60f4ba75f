//! Persistence sinks and auto-save

use cfgdoc::{FileStore, PersistenceSink, SectionKind};

use crate::helpers::*;

#[test]
fn test_auto_save_after_each_mutation() {
    let sink = RecordingSink::auto();
    let mut doc = sample_doc();
    doc.set_persistence(Box::new(sink.clone()));

    let root = doc.root_group();
    let section = doc.add_section(root, "extra", SectionKind::NameValue).unwrap();
    assert_eq!(sink.count(), 1);
    doc.properties_mut(section).unwrap().add("k", Some("v"), None).unwrap();
    assert_eq!(sink.count(), 2);
    assert!(!doc.is_dirty());
    assert_eq!(sink.last().unwrap(), doc.to_xml().unwrap());
}

#[test]
fn test_failed_operations_do_not_save() {
    let sink = RecordingSink::auto();
    let mut doc = sample_doc();
    doc.set_persistence(Box::new(sink.clone()));

    let root = doc.root_group();
    assert!(doc.add_group(root, "system.web").is_err());
    let notes = section_at(&doc, "notes");
    doc.set_text(notes, "free text").unwrap();
    assert_eq!(sink.count(), 0);
}

#[test]
fn test_manual_save() {
    let sink = RecordingSink::default();
    let mut doc = sample_doc();
    doc.set_persistence(Box::new(sink.clone()));

    let root = doc.root_group();
    doc.add_group(root, "grp").unwrap();
    assert_eq!(sink.count(), 0);
    assert!(doc.is_dirty());

    doc.save().unwrap();
    assert_eq!(sink.count(), 1);
    assert!(!doc.is_dirty());
}

#[test]
fn test_sink_errors_propagate() {
    let sink = RecordingSink::auto();
    sink.set_failing(true);
    let mut doc = sample_doc();
    doc.set_persistence(Box::new(sink.clone()));

    let root = doc.root_group();
    let err = doc.add_group(root, "grp").unwrap_err();
    assert!(err.is_persistence_error());
    // The mutation itself stands; only the save failed
    assert!(doc.find(root, "grp").unwrap().is_some());
    assert!(doc.is_dirty());

    sink.set_failing(false);
    doc.save().unwrap();
    assert_eq!(sink.count(), 1);
}

#[test]
fn test_take_persistence_detaches_sink() {
    let sink = RecordingSink::auto();
    let mut doc = sample_doc();
    doc.set_persistence(Box::new(sink.clone()));
    let taken = doc.take_persistence().unwrap();
    assert!(taken.auto_save());

    let root = doc.root_group();
    doc.add_group(root, "grp").unwrap();
    assert_eq!(sink.count(), 0);
    assert!(doc.save().unwrap_err().is_persistence_error());
}

#[test]
fn test_file_store_open_and_auto_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("web.config");
    std::fs::write(&path, SAMPLE_CONFIG).unwrap();

    let mut doc = FileStore::new(&path).with_auto_save(true).open().unwrap();
    let pages = section_at(&doc, "system.web/pages");
    doc.properties_mut(pages).unwrap().set("theme", Some("light")).unwrap();

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, doc.to_xml().unwrap());

    let reloaded = FileStore::new(&path).load().unwrap();
    let pages = section_at(&reloaded, "system.web/pages");
    assert_eq!(
        reloaded.properties(pages).unwrap().get_value("theme").unwrap().as_deref(),
        Some("light")
    );
}

#[test]
fn test_file_store_write_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path().join("missing").join("app.config"));
    let err = store.save("<configuration />").unwrap_err();
    assert!(err.is_persistence_error());
    assert_eq!(store.path(), dir.path().join("missing").join("app.config"));
}
