//! Ordered Add/Remove/Clear directive collections.
//!
//! A property set is the list of directive elements directly inside a
//! section. It has two views:
//!
//! - the raw view: the literal entries in document order, addressed by index
//! - the effective view: the key/value map left after folding the entries in
//!   order, where Clear empties the map, Add sets a key and Remove deletes it
//!
//! Comment nodes between entries are not entries; each is the comment slot of
//! the entry that follows it.

use std::fmt;

use tracing::debug;

use crate::{
    ConfigDocument, Result, SectionHandle, comment,
    constants::{DIRECTIVE_ADD, DIRECTIVE_CLEAR, DIRECTIVE_REMOVE},
    dom::{Dom, NodeId},
};

use super::{PropertySchema, SectionError, check_storable};

/// The three directive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Add,
    Remove,
    Clear,
}

impl Directive {
    /// Element name of the directive
    pub fn element_name(&self) -> &'static str {
        match self {
            Directive::Add => DIRECTIVE_ADD,
            Directive::Remove => DIRECTIVE_REMOVE,
            Directive::Clear => DIRECTIVE_CLEAR,
        }
    }

    pub fn from_element_name(name: &str) -> Option<Directive> {
        match name {
            DIRECTIVE_ADD => Some(Directive::Add),
            DIRECTIVE_REMOVE => Some(Directive::Remove),
            DIRECTIVE_CLEAR => Some(Directive::Clear),
            _ => None,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Snapshot of one raw entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    pub directive: Directive,
    pub key: Option<String>,
    pub value: Option<String>,
    /// Text of the attached comment, if any
    pub comment: Option<String>,
    /// The entry's element, usable with [`ConfigDocument::comment`]
    pub node: NodeId,
}

/// Read-only view of a section's property set
#[derive(Debug)]
pub struct PropertySet<'a> {
    dom: &'a Dom,
    owner: NodeId,
    schema: &'static PropertySchema,
    section: String,
}

impl<'a> PropertySet<'a> {
    /// The element holding the entries
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn schema(&self) -> &'static PropertySchema {
        self.schema
    }

    fn entry_nodes(&self) -> Result<Vec<(NodeId, Directive)>> {
        let mut nodes = Vec::new();
        for child in self.dom.child_elements(self.owner)? {
            if let Some(directive) = Directive::from_element_name(self.dom.name(child)?) {
                nodes.push((child, directive));
            }
        }
        Ok(nodes)
    }

    /// Number of raw entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.entry_nodes()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn out_of_bounds(&self, index: usize, len: usize) -> crate::Error {
        SectionError::IndexOutOfBounds {
            section: self.section.clone(),
            index,
            len,
        }
        .into()
    }

    /// Element of the raw entry at `index`
    pub fn entry_node(&self, index: usize) -> Result<NodeId> {
        let nodes = self.entry_nodes()?;
        nodes
            .get(index)
            .map(|(node, _)| *node)
            .ok_or_else(|| self.out_of_bounds(index, nodes.len()))
    }

    /// Raw entry at `index`
    pub fn get_at(&self, index: usize) -> Result<PropertyEntry> {
        let nodes = self.entry_nodes()?;
        let (node, directive) = nodes
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_bounds(index, nodes.len()))?;
        self.read_entry(node, directive)
    }

    /// Every raw entry in document order
    pub fn entries(&self) -> Result<Vec<PropertyEntry>> {
        self.entry_nodes()?
            .into_iter()
            .map(|(node, directive)| self.read_entry(node, directive))
            .collect()
    }

    fn read_entry(&self, node: NodeId, directive: Directive) -> Result<PropertyEntry> {
        let attr = |name: &str| -> Result<Option<String>> {
            Ok(self.dom.attribute(node, name)?.map(str::to_string))
        };
        let comment = match comment::attached(self.dom, node)? {
            Some(comment) => Some(self.dom.text(comment)?),
            None => None,
        };
        Ok(PropertyEntry {
            directive,
            key: attr(self.schema.key_attribute)?,
            value: attr(self.schema.value_attribute)?,
            comment,
            node,
        })
    }

    /// Folds the raw entries into the ordered key/value pairs they leave behind.
    ///
    /// Keys keep the position of their first Add since the last Clear; a later
    /// Add for a live key overwrites the value in place. Entries missing their
    /// key attribute are skipped.
    pub fn effective(&self) -> Result<Vec<(String, Option<String>)>> {
        let keys = self.schema.keys;
        let mut state: Vec<(String, Option<String>)> = Vec::new();
        for entry in self.entries()? {
            match (entry.directive, entry.key) {
                (Directive::Clear, _) => state.clear(),
                (Directive::Add, Some(key)) => {
                    match state.iter_mut().find(|(k, _)| keys.matches(k, &key)) {
                        Some((_, value)) => *value = entry.value,
                        None => state.push((key, entry.value)),
                    }
                }
                (Directive::Remove, Some(key)) => state.retain(|(k, _)| !keys.matches(k, &key)),
                (_, None) => {}
            }
        }
        Ok(state)
    }

    /// Effective value of `key`.
    ///
    /// Returns `Ok(None)` when the key is live but its Add entry carries no
    /// value.
    ///
    /// # Errors
    /// `SectionError::KeyNotFound` if the key is absent after folding.
    pub fn get_value(&self, key: impl AsRef<str>) -> Result<Option<String>> {
        let key = key.as_ref();
        self.effective()?
            .into_iter()
            .find(|(k, _)| self.schema.keys.matches(k, key))
            .map(|(_, value)| value)
            .ok_or_else(|| {
                SectionError::KeyNotFound {
                    section: self.section.clone(),
                    key: key.to_string(),
                }
                .into()
            })
    }

    /// Effective value of `key`, which must be present and carry a value
    pub fn get_string(&self, key: impl AsRef<str>) -> Result<String> {
        let key = key.as_ref();
        self.get_value(key)?.ok_or_else(|| {
            SectionError::ValueMissing {
                section: self.section.clone(),
                key: key.to_string(),
            }
            .into()
        })
    }

    /// Returns true if `key` is live after folding
    pub fn contains_key(&self, key: impl AsRef<str>) -> Result<bool> {
        let key = key.as_ref();
        Ok(self
            .effective()?
            .iter()
            .any(|(k, _)| self.schema.keys.matches(k, key)))
    }

    /// Index of the last live Add entry for `key`
    fn live_add_index(&self, key: &str) -> Result<Option<usize>> {
        let mut live = None;
        for (index, entry) in self.entries()?.into_iter().enumerate() {
            let matches = entry
                .key
                .as_deref()
                .is_some_and(|k| self.schema.keys.matches(k, key));
            match entry.directive {
                Directive::Clear => live = None,
                Directive::Add if matches => live = Some(index),
                Directive::Remove if matches => live = None,
                _ => {}
            }
        }
        Ok(live)
    }
}

/// Mutable view of a section's property set.
///
/// Every successful mutation is committed to the document immediately,
/// including auto-save.
#[derive(Debug)]
pub struct PropertySetMut<'a> {
    doc: &'a mut ConfigDocument,
    section: SectionHandle,
    schema: &'static PropertySchema,
    label: String,
}

impl<'a> PropertySetMut<'a> {
    /// Read-only view of the current entries
    pub fn view(&self) -> PropertySet<'_> {
        PropertySet {
            dom: self.doc.dom(),
            owner: self.section.node(),
            schema: self.schema,
            section: self.label.clone(),
        }
    }

    fn check_directive(&self, directive: Directive) -> Result<()> {
        if !self.schema.allows(directive) {
            return Err(SectionError::DirectiveNotAllowed {
                section: self.label.clone(),
                directive: directive.element_name(),
            }
            .into());
        }
        Ok(())
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(SectionError::EmptyKey {
                section: self.label.clone(),
            }
            .into());
        }
        check_storable(&self.label, key)
    }

    fn check_value(&self, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => check_storable(&self.label, value),
            None => Ok(()),
        }
    }

    /// Appends a directive element with the given attributes and optional comment
    fn append(
        &mut self,
        directive: Directive,
        attributes: &[(&'static str, &str)],
        comment_text: Option<&str>,
    ) -> Result<NodeId> {
        if let Some(text) = comment_text {
            comment::validate(text)?;
        }
        let owner = self.section.node();
        let dom = self.doc.dom_mut();
        let node = dom.create_element(directive.element_name());
        for (name, value) in attributes {
            dom.set_attribute(node, *name, *value)?;
        }
        dom.append_child(owner, node)?;
        if let Some(text) = comment_text {
            comment::attach(dom, node, text)?;
        }
        debug!(section = %self.label, %directive, "appended property directive");
        self.doc.commit()?;
        Ok(node)
    }

    /// Appends an Add entry.
    ///
    /// # Errors
    /// - `SectionError::DuplicateKey` if `key` is already live; the set is
    ///   left unchanged
    /// - `SectionError::EmptyKey` for an empty key
    /// - `SectionError::InvalidValue` if the key or value holds a character
    ///   XML cannot carry
    /// - `CommentError::InvalidText` if the comment cannot be stored
    pub fn add(
        &mut self,
        key: impl AsRef<str>,
        value: Option<&str>,
        comment: Option<&str>,
    ) -> Result<NodeId> {
        let key = key.as_ref();
        self.check_directive(Directive::Add)?;
        self.check_key(key)?;
        self.check_value(value)?;
        if self.view().contains_key(key)? {
            return Err(SectionError::DuplicateKey {
                section: self.label.clone(),
                key: key.to_string(),
            }
            .into());
        }
        let mut attributes = vec![(self.schema.key_attribute, key)];
        if let Some(value) = value {
            attributes.push((self.schema.value_attribute, value));
        }
        self.append(Directive::Add, &attributes, comment)
    }

    /// Sets the value of a live key in place, or adds it if absent
    pub fn set(&mut self, key: impl AsRef<str>, value: Option<&str>) -> Result<NodeId> {
        let key = key.as_ref();
        self.check_key(key)?;
        self.check_value(value)?;
        let Some(index) = self.view().live_add_index(key)? else {
            return self.add(key, value, None);
        };
        let node = self.view().entry_node(index)?;
        let value_attribute = self.schema.value_attribute;
        let dom = self.doc.dom_mut();
        match value {
            Some(value) => dom.set_attribute(node, value_attribute, value)?,
            None => {
                dom.remove_attribute(node, value_attribute)?;
            }
        }
        debug!(section = %self.label, key, "updated property value");
        self.doc.commit()?;
        Ok(node)
    }

    /// Appends a Remove entry for `key`
    pub fn remove(&mut self, key: impl AsRef<str>) -> Result<NodeId> {
        let key = key.as_ref();
        self.check_directive(Directive::Remove)?;
        self.check_key(key)?;
        let attributes = [(self.schema.key_attribute, key)];
        self.append(Directive::Remove, &attributes, None)
    }

    /// Appends a Clear entry
    pub fn clear(&mut self) -> Result<NodeId> {
        self.check_directive(Directive::Clear)?;
        self.append(Directive::Clear, &[], None)
    }

    /// Removes the raw entry at `index` together with its comment
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        let node = self.view().entry_node(index)?;
        let dom = self.doc.dom_mut();
        comment::remove_attached(dom, node)?;
        dom.remove(node)?;
        debug!(section = %self.label, index, "removed property entry");
        self.doc.commit()
    }
}

impl ConfigDocument {
    fn property_schema(&self, section: SectionHandle) -> Result<&'static PropertySchema> {
        let kind = self.section_kind(section)?;
        let schema = kind.schema().ok_or_else(|| SectionError::KindMismatch {
            section: self.section_label(section),
            expected: "a property section",
            actual: kind.name(),
        })?;
        self.expect_plain(section, section.node())?;
        Ok(schema)
    }

    /// Read view of a property section's entries.
    ///
    /// # Errors
    /// - `SectionError::KindMismatch` for text and native sections
    /// - `SectionError::Protected` while the section is encrypted
    pub fn properties(&self, section: SectionHandle) -> Result<PropertySet<'_>> {
        let schema = self.property_schema(section)?;
        Ok(PropertySet {
            dom: self.dom(),
            owner: section.node(),
            schema,
            section: self.section_label(section),
        })
    }

    /// Mutable view of a property section's entries
    pub fn properties_mut(&mut self, section: SectionHandle) -> Result<PropertySetMut<'_>> {
        let schema = self.property_schema(section)?;
        let label = self.section_label(section);
        Ok(PropertySetMut {
            doc: self,
            section,
            schema,
            label,
        })
    }
}
