//! Native dictionary/list/string trees.
//!
//! Native sections hold a recursive tree rather than a flat directive list:
//!
//! ```xml
//! <settings>
//!   <dictionary name="default">
//!     <string name="host">localhost</string>
//!     <list name="ports">
//!       <string>80</string>
//!       <string>443</string>
//!     </list>
//!   </dictionary>
//! </settings>
//! ```
//!
//! The section element itself takes the shape of its kind. Children of a
//! dictionary carry a `name` attribute; list items do not. Any `<dictionary>`
//! node can be protected on its own, in which case it reads back as
//! [`XValue::Protected`].

use tracing::debug;

use crate::{
    ConfigDocument, Result, SectionHandle, comment,
    constants::{ATTR_NAME, NATIVE_DICTIONARY, NATIVE_LIST, NATIVE_STRING},
    dom::{Dom, NodeId},
};

use super::{SectionError, check_storable};

/// Shape of a native tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeShape {
    Dictionary,
    List,
    String,
}

impl NativeShape {
    pub fn element_name(&self) -> &'static str {
        match self {
            NativeShape::Dictionary => NATIVE_DICTIONARY,
            NativeShape::List => NATIVE_LIST,
            NativeShape::String => NATIVE_STRING,
        }
    }

    pub fn from_element_name(name: &str) -> Option<NativeShape> {
        match name {
            NATIVE_DICTIONARY => Some(NativeShape::Dictionary),
            NATIVE_LIST => Some(NativeShape::List),
            NATIVE_STRING => Some(NativeShape::String),
            _ => None,
        }
    }
}

/// Owned value of a native tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XValue {
    String(String),
    List(Vec<XValue>),
    /// Named entries in document order
    Dictionary(Vec<(String, XValue)>),
    /// An encrypted dictionary; only produced when reading
    Protected,
}

impl XValue {
    /// Convenience constructor for string values
    pub fn string(value: impl Into<String>) -> Self {
        XValue::String(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            XValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Looks up a named entry of a dictionary value
    pub fn get(&self, name: &str) -> Option<&XValue> {
        match self {
            XValue::Dictionary(entries) => entries.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    fn shape(&self) -> Option<NativeShape> {
        match self {
            XValue::String(_) => Some(NativeShape::String),
            XValue::List(_) => Some(NativeShape::List),
            XValue::Dictionary(_) => Some(NativeShape::Dictionary),
            XValue::Protected => None,
        }
    }
}

fn malformed(node: NodeId, reason: impl Into<String>) -> crate::Error {
    SectionError::MalformedNative {
        node,
        reason: reason.into(),
    }
    .into()
}

fn is_protected(dom: &Dom, node: NodeId) -> Result<bool> {
    Ok(dom.attribute(node, crate::constants::ATTR_PROTECTED)? == Some("true"))
}

/// Reads `node` as a value of the given shape
fn read_value(dom: &Dom, node: NodeId, shape: NativeShape) -> Result<XValue> {
    if is_protected(dom, node)? {
        return Ok(XValue::Protected);
    }
    match shape {
        NativeShape::String => Ok(XValue::String(dom.text(node)?)),
        NativeShape::List => {
            let mut items = Vec::new();
            for child in dom.child_elements(node)? {
                items.push(read_value(dom, child, child_shape(dom, child)?)?);
            }
            Ok(XValue::List(items))
        }
        NativeShape::Dictionary => {
            let mut entries = Vec::new();
            for child in dom.child_elements(node)? {
                let name = dom
                    .attribute(child, ATTR_NAME)?
                    .ok_or_else(|| malformed(child, "dictionary entry without a name"))?
                    .to_string();
                entries.push((name, read_value(dom, child, child_shape(dom, child)?)?));
            }
            Ok(XValue::Dictionary(entries))
        }
    }
}

fn child_shape(dom: &Dom, child: NodeId) -> Result<NativeShape> {
    let name = dom.name(child)?;
    NativeShape::from_element_name(name)
        .ok_or_else(|| malformed(child, format!("unexpected element '{name}'")))
}

/// Rejects values that cannot be written, or that XML cannot carry unchanged
fn check_writable(value: &XValue, node: NodeId, section: &str) -> Result<()> {
    match value {
        XValue::Protected => Err(malformed(node, "a protected placeholder cannot be written")),
        XValue::String(text) => check_storable(section, text),
        XValue::List(items) => items
            .iter()
            .try_for_each(|item| check_writable(item, node, section)),
        XValue::Dictionary(entries) => entries.iter().try_for_each(|(name, value)| {
            if name.is_empty() {
                return Err(malformed(node, "dictionary entry with an empty name"));
            }
            check_storable(section, name)?;
            check_writable(value, node, section)
        }),
    }
}

/// Builds a detached node for `value`; `parent` is only used for error reporting
fn build(dom: &mut Dom, value: &XValue, name: Option<&str>, parent: NodeId) -> Result<NodeId> {
    let Some(shape) = value.shape() else {
        return Err(malformed(parent, "a protected placeholder cannot be written"));
    };
    let node = dom.create_element(shape.element_name());
    if let Some(name) = name {
        dom.set_attribute(node, ATTR_NAME, name)?;
    }
    fill(dom, node, value)?;
    Ok(node)
}

/// Writes the children of `node` from `value`
fn fill(dom: &mut Dom, node: NodeId, value: &XValue) -> Result<()> {
    match value {
        XValue::String(text) => {
            if !text.is_empty() {
                let text = dom.create_text(text.as_str());
                dom.append_child(node, text)?;
            }
        }
        XValue::List(items) => {
            for item in items {
                let child = build(dom, item, None, node)?;
                dom.append_child(node, child)?;
            }
        }
        XValue::Dictionary(entries) => {
            for (name, value) in entries {
                let child = build(dom, value, Some(name), node)?;
                dom.append_child(node, child)?;
            }
        }
        XValue::Protected => {}
    }
    Ok(())
}

/// Read-only view of a native tree node
#[derive(Debug)]
pub struct NativeTree<'a> {
    dom: &'a Dom,
    node: NodeId,
    shape: NativeShape,
    section: String,
}

impl<'a> NativeTree<'a> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn shape(&self) -> NativeShape {
        self.shape
    }

    /// Returns true if this node's children are an encrypted payload
    pub fn is_protected(&self) -> Result<bool> {
        is_protected(self.dom, self.node)
    }

    fn expect_shape(&self, expected: NativeShape) -> Result<()> {
        if self.shape != expected {
            return Err(SectionError::KindMismatch {
                section: self.section.clone(),
                expected: expected.element_name(),
                actual: self.shape.element_name(),
            }
            .into());
        }
        Ok(())
    }

    fn expect_plain(&self) -> Result<()> {
        if self.is_protected()? {
            return Err(SectionError::Protected {
                section: self.section.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// The whole subtree as an owned value
    pub fn value(&self) -> Result<XValue> {
        self.expect_plain()?;
        read_value(self.dom, self.node, self.shape)
    }

    /// Names of a dictionary's entries in document order
    pub fn keys(&self) -> Result<Vec<String>> {
        self.expect_shape(NativeShape::Dictionary)?;
        self.expect_plain()?;
        let mut keys = Vec::new();
        for child in self.dom.child_elements(self.node)? {
            if let Some(name) = self.dom.attribute(child, ATTR_NAME)? {
                keys.push(name.to_string());
            }
        }
        Ok(keys)
    }

    /// Number of entries of a dictionary or items of a list
    pub fn len(&self) -> Result<usize> {
        if self.shape == NativeShape::String {
            return Err(SectionError::KindMismatch {
                section: self.section.clone(),
                expected: "dictionary or list",
                actual: NATIVE_STRING,
            }
            .into());
        }
        self.expect_plain()?;
        Ok(self.dom.child_elements(self.node)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Element of the dictionary entry `name`
    pub fn node_of(&self, name: &str) -> Result<Option<NodeId>> {
        self.expect_shape(NativeShape::Dictionary)?;
        self.expect_plain()?;
        for child in self.dom.child_elements(self.node)? {
            if self.dom.attribute(child, ATTR_NAME)? == Some(name) {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Value of the dictionary entry `name`
    pub fn get(&self, name: &str) -> Result<Option<XValue>> {
        match self.node_of(name)? {
            Some(child) => Ok(Some(read_value(self.dom, child, child_shape(self.dom, child)?)?)),
            None => Ok(None),
        }
    }

    /// View of the dictionary entry `name`
    pub fn child(&self, name: &str) -> Result<Option<NativeTree<'a>>> {
        match self.node_of(name)? {
            Some(child) => Ok(Some(self.view_of(child)?)),
            None => Ok(None),
        }
    }

    /// View of the list item at `index`
    pub fn item(&self, index: usize) -> Result<Option<NativeTree<'a>>> {
        self.expect_shape(NativeShape::List)?;
        self.expect_plain()?;
        match self.dom.child_elements(self.node)?.get(index) {
            Some(child) => Ok(Some(self.view_of(*child)?)),
            None => Ok(None),
        }
    }

    fn view_of(&self, child: NodeId) -> Result<NativeTree<'a>> {
        Ok(NativeTree {
            dom: self.dom,
            node: child,
            shape: child_shape(self.dom, child)?,
            section: self.section.clone(),
        })
    }
}

/// Mutable view of a native tree node.
///
/// Mutations commit to the document immediately.
#[derive(Debug)]
pub struct NativeTreeMut<'a> {
    doc: &'a mut ConfigDocument,
    node: NodeId,
    shape: NativeShape,
    section: String,
}

impl<'a> NativeTreeMut<'a> {
    /// Read-only view of this node
    pub fn view(&self) -> NativeTree<'_> {
        NativeTree {
            dom: self.doc.dom(),
            node: self.node,
            shape: self.shape,
            section: self.section.clone(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Sets the dictionary entry `name`, replacing an existing entry in place
    pub fn set(&mut self, name: &str, value: &XValue) -> Result<NodeId> {
        let view = self.view();
        view.expect_shape(NativeShape::Dictionary)?;
        view.expect_plain()?;
        if name.is_empty() {
            return Err(SectionError::EmptyKey {
                section: self.section.clone(),
            }
            .into());
        }
        check_storable(&self.section, name)?;
        check_writable(value, self.node, &self.section)?;
        let existing = view.node_of(name)?;

        let dom = self.doc.dom_mut();
        let child = build(dom, value, Some(name), self.node)?;
        match existing {
            Some(old) => {
                // The old entry's comment stays in front of the replacement
                dom.insert_before(old, child)?;
                dom.remove(old)?;
            }
            None => dom.append_child(self.node, child)?,
        }
        debug!(section = %self.section, name, "set native entry");
        self.doc.commit()?;
        Ok(child)
    }

    /// Removes the dictionary entry `name` and its comment
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let existing = self.view().node_of(name)?;
        let old = existing.ok_or_else(|| SectionError::KeyNotFound {
            section: self.section.clone(),
            key: name.to_string(),
        })?;
        let dom = self.doc.dom_mut();
        comment::remove_attached(dom, old)?;
        dom.remove(old)?;
        debug!(section = %self.section, name, "removed native entry");
        self.doc.commit()
    }

    /// Appends an item to a list
    pub fn push(&mut self, value: &XValue) -> Result<NodeId> {
        let view = self.view();
        view.expect_shape(NativeShape::List)?;
        view.expect_plain()?;
        check_writable(value, self.node, &self.section)?;
        let dom = self.doc.dom_mut();
        let child = build(dom, value, None, self.node)?;
        dom.append_child(self.node, child)?;
        debug!(section = %self.section, "appended native list item");
        self.doc.commit()?;
        Ok(child)
    }

    /// Whitespace is only kept on load inside `<string>` elements, not on
    /// an `XString` section element
    fn check_string_text(&self, text: &str) -> Result<()> {
        check_storable(&self.section, text)?;
        let keeps_whitespace = self.doc.dom().name(self.node)? == NATIVE_STRING;
        if !keeps_whitespace && !text.is_empty() && text.trim().is_empty() {
            return Err(SectionError::InvalidValue {
                section: self.section.clone(),
                reason: "a string section made only of whitespace does not survive reloading"
                    .to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Replaces the text of a string node
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.view().expect_shape(NativeShape::String)?;
        self.check_string_text(text)?;
        let dom = self.doc.dom_mut();
        dom.clear_children(self.node)?;
        fill(dom, self.node, &XValue::string(text))?;
        self.doc.commit()
    }

    /// Replaces the whole content of this node.
    ///
    /// The value must have this node's shape.
    pub fn replace(&mut self, value: &XValue) -> Result<()> {
        let view = self.view();
        view.expect_plain()?;
        check_writable(value, self.node, &self.section)?;
        if value.shape() != Some(self.shape) {
            return Err(malformed(self.node, "replacement value has a different shape"));
        }
        if let XValue::String(text) = value {
            self.check_string_text(text)?;
        }
        let dom = self.doc.dom_mut();
        dom.clear_children(self.node)?;
        fill(dom, self.node, value)?;
        debug!(section = %self.section, "replaced native node content");
        self.doc.commit()
    }

    /// Mutable view of the dictionary entry `name`
    pub fn child_mut(&mut self, name: &str) -> Result<NativeTreeMut<'_>> {
        let child = self.view().node_of(name)?.ok_or_else(|| SectionError::KeyNotFound {
            section: self.section.clone(),
            key: name.to_string(),
        })?;
        let shape = child_shape(self.doc.dom(), child)?;
        Ok(NativeTreeMut {
            doc: &mut *self.doc,
            node: child,
            shape,
            section: self.section.clone(),
        })
    }
}

impl ConfigDocument {
    fn native_root(&self, section: SectionHandle) -> Result<(NativeShape, String)> {
        let kind = self.section_kind(section)?;
        let shape = kind.native_shape().ok_or_else(|| SectionError::KindMismatch {
            section: self.section_label(section),
            expected: "a native section",
            actual: kind.name(),
        })?;
        Ok((shape, self.section_label(section)))
    }

    /// Read view of a native section's tree
    pub fn native(&self, section: SectionHandle) -> Result<NativeTree<'_>> {
        let (shape, label) = self.native_root(section)?;
        self.expect_plain(section, section.node())?;
        Ok(NativeTree {
            dom: self.dom(),
            node: section.node(),
            shape,
            section: label,
        })
    }

    /// Mutable view of a native section's tree
    pub fn native_mut(&mut self, section: SectionHandle) -> Result<NativeTreeMut<'_>> {
        let (shape, label) = self.native_root(section)?;
        self.expect_plain(section, section.node())?;
        Ok(NativeTreeMut {
            doc: self,
            node: section.node(),
            shape,
            section: label,
        })
    }
}
