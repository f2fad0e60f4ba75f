//! The declaration tree held in `configSections`.
//!
//! Every content group and section below the root has exactly one declaration
//! here: a `sectionGroup` element for groups (nesting further declarations) and
//! a `section` element for sections. Each declaration carries the entry's name
//! and the handler type string that decides the section's kind.

use crate::{
    Result,
    constants::{ATTR_NAME, ATTR_TYPE, GROUP_HANDLER_TYPE, SECTION, SECTION_GROUP},
    dom::{Dom, NodeId},
};

use super::{ConfigPath, RegistryError};

/// Whether a declaration describes a group or a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Group,
    Section,
}

impl DeclarationKind {
    /// Human readable name used in errors
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Group => "group",
            DeclarationKind::Section => "section",
        }
    }
}

/// A snapshot of one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationEntry {
    /// Declared name
    pub name: String,
    /// Handler type string as written in the document
    pub handler_type: String,
    /// Path of the group this declaration lives in
    pub path: ConfigPath,
    /// Group or section
    pub kind: DeclarationKind,
}

impl DeclarationEntry {
    /// Path naming the declared entry itself
    pub fn full_path(&self) -> ConfigPath {
        self.path.join(self.name.clone())
    }
}

/// Accessor for the `configSections` element of a document.
///
/// The registry owns no nodes itself; it interprets the declaration elements
/// stored in the document's arena.
#[derive(Debug, Clone, Copy)]
pub struct DeclarationRegistry {
    container: NodeId,
}

impl DeclarationRegistry {
    pub(crate) fn new(container: NodeId) -> Self {
        Self { container }
    }

    /// The `configSections` element
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Returns the declaration element listing the entries of the group at `path`.
    ///
    /// The root group's level is the container itself. Returns `None` if any
    /// segment is not a declared group.
    pub fn level(&self, dom: &Dom, path: &ConfigPath) -> Result<Option<NodeId>> {
        let mut current = self.container;
        for segment in path.segments() {
            match self.lookup_in(dom, current, segment)? {
                Some(decl) if is_group(dom, decl)? => current = decl,
                _ => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Declarations directly inside a level, in document order
    pub fn children(&self, dom: &Dom, level: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for child in dom.child_elements(level)? {
            let name = dom.name(child)?;
            if name == SECTION_GROUP || name == SECTION {
                out.push(child);
            }
        }
        Ok(out)
    }

    /// Finds the declaration named `name` inside a level
    pub fn lookup_in(&self, dom: &Dom, level: NodeId, name: &str) -> Result<Option<NodeId>> {
        for decl in self.children(dom, level)? {
            if dom.attribute(decl, ATTR_NAME)? == Some(name) {
                return Ok(Some(decl));
            }
        }
        Ok(None)
    }

    /// Finds the declaration for `name` inside the group at `parent`
    pub fn lookup(&self, dom: &Dom, parent: &ConfigPath, name: &str) -> Result<Option<NodeId>> {
        match self.level(dom, parent)? {
            Some(level) => self.lookup_in(dom, level, name),
            None => Ok(None),
        }
    }

    /// Creates a group declaration inside `level`.
    ///
    /// Group declarations are placed before the first section declaration of
    /// the level.
    pub(crate) fn declare_group(&self, dom: &mut Dom, level: NodeId, name: &str) -> Result<NodeId> {
        let decl = dom.create_element(SECTION_GROUP);
        dom.set_attribute(decl, ATTR_NAME, name)?;
        dom.set_attribute(decl, ATTR_TYPE, GROUP_HANDLER_TYPE)?;
        let first_section = self
            .children(dom, level)?
            .into_iter()
            .find(|child| dom.name(*child).is_ok_and(|n| n == SECTION));
        let placed = match first_section {
            Some(section) => dom.insert_before(section, decl),
            None => dom.append_child(level, decl),
        };
        if let Err(err) = placed {
            dom.remove(decl)?;
            return Err(err.into());
        }
        Ok(decl)
    }

    /// Creates a section declaration at the end of `level`
    pub(crate) fn declare_section(
        &self,
        dom: &mut Dom,
        level: NodeId,
        name: &str,
        handler_type: &str,
    ) -> Result<NodeId> {
        let decl = dom.create_element(SECTION);
        dom.set_attribute(decl, ATTR_NAME, name)?;
        dom.set_attribute(decl, ATTR_TYPE, handler_type)?;
        if let Err(err) = dom.append_child(level, decl) {
            dom.remove(decl)?;
            return Err(err.into());
        }
        Ok(decl)
    }

    /// Builds the snapshot for one declaration element
    pub fn entry(&self, dom: &Dom, decl: NodeId, parent: &ConfigPath) -> Result<DeclarationEntry> {
        let name = declared_name(dom, decl, parent)?;
        let kind = if is_group(dom, decl)? {
            DeclarationKind::Group
        } else {
            DeclarationKind::Section
        };
        let handler_type = dom.attribute(decl, ATTR_TYPE)?.unwrap_or_default().to_string();
        Ok(DeclarationEntry {
            name,
            handler_type,
            path: parent.clone(),
            kind,
        })
    }

    /// Every declaration in the document, depth first in document order
    pub fn entries(&self, dom: &Dom) -> Result<Vec<DeclarationEntry>> {
        let mut out = Vec::new();
        self.collect(dom, self.container, &ConfigPath::root(), &mut out)?;
        Ok(out)
    }

    fn collect(
        &self,
        dom: &Dom,
        level: NodeId,
        path: &ConfigPath,
        out: &mut Vec<DeclarationEntry>,
    ) -> Result<()> {
        for decl in self.children(dom, level)? {
            let entry = self.entry(dom, decl, path)?;
            let nested = (entry.kind == DeclarationKind::Group).then(|| entry.full_path());
            out.push(entry);
            if let Some(nested) = nested {
                self.collect(dom, decl, &nested, out)?;
            }
        }
        Ok(())
    }
}

/// Returns true if the declaration element is a `sectionGroup`
pub(crate) fn is_group(dom: &Dom, decl: NodeId) -> Result<bool> {
    Ok(dom.name(decl)? == SECTION_GROUP)
}

/// Reads the `name` attribute of a declaration, which every declaration must carry
pub(crate) fn declared_name(dom: &Dom, decl: NodeId, parent: &ConfigPath) -> Result<String> {
    match dom.attribute(decl, ATTR_NAME)? {
        Some(name) => Ok(name.to_string()),
        None => Err(RegistryError::Incongruent {
            path: parent.to_string(),
            reason: format!("{} declaration without a name attribute", dom.name(decl)?),
        }
        .into()),
    }
}
