//! The configuration document and its group/section dual tree.
//!
//! A [`ConfigDocument`] owns every node of a configuration file. Groups and
//! sections exist twice: once as a declaration inside `configSections`
//! (see [`DeclarationRegistry`]) and once as a content element at the same
//! path below the root. All structural mutations go through the document so
//! the two trees stay congruent after every call.

use std::{collections::HashSet, fmt};

use tracing::{debug, info, warn};

use crate::{
    Result,
    comment,
    constants::{ATTR_FOREIGN_PROTECTION, ATTR_PROTECTED, ATTR_TYPE, CONFIG_SECTIONS, CONFIGURATION},
    dom::{self, Dom, NodeId},
    persistence::{PersistenceError, PersistenceSink},
    section::{BuiltinSection, SectionKind},
};

mod errors;
mod path;
mod registry;

pub use errors::RegistryError;
pub use path::ConfigPath;
pub use registry::{DeclarationEntry, DeclarationKind, DeclarationRegistry};

use registry::{declared_name, is_group};

/// Handle to a section group's content node.
///
/// Equality is handle identity: two handles are equal exactly when they name
/// the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(NodeId);

impl GroupHandle {
    /// The underlying arena handle
    pub fn node(&self) -> NodeId {
        self.0
    }
}

impl From<GroupHandle> for NodeId {
    fn from(handle: GroupHandle) -> Self {
        handle.0
    }
}

/// Handle to a section's content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionHandle(NodeId);

impl SectionHandle {
    /// The underlying arena handle
    pub fn node(&self) -> NodeId {
        self.0
    }
}

impl From<SectionHandle> for NodeId {
    fn from(handle: SectionHandle) -> Self {
        handle.0
    }
}

/// A content node found by name or path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigNode {
    Group(GroupHandle),
    Section(SectionHandle),
}

impl ConfigNode {
    /// The underlying arena handle
    pub fn node(&self) -> NodeId {
        match self {
            ConfigNode::Group(group) => group.0,
            ConfigNode::Section(section) => section.0,
        }
    }

    pub fn as_group(&self) -> Option<GroupHandle> {
        match self {
            ConfigNode::Group(group) => Some(*group),
            ConfigNode::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<SectionHandle> {
        match self {
            ConfigNode::Section(section) => Some(*section),
            ConfigNode::Group(_) => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ConfigNode::Group(_) => DeclarationKind::Group.as_str(),
            ConfigNode::Section(_) => DeclarationKind::Section.as_str(),
        }
    }
}

impl From<GroupHandle> for ConfigNode {
    fn from(handle: GroupHandle) -> Self {
        ConfigNode::Group(handle)
    }
}

impl From<SectionHandle> for ConfigNode {
    fn from(handle: SectionHandle) -> Self {
        ConfigNode::Section(handle)
    }
}

impl From<ConfigNode> for NodeId {
    fn from(node: ConfigNode) -> Self {
        node.node()
    }
}

/// An in-memory configuration document.
///
/// # Examples
///
/// ```
/// use cfgdoc::{ConfigDocument, SectionKind};
///
/// let mut doc = ConfigDocument::new();
/// let root = doc.root_group();
/// let web = doc.add_group(root, "system.web").unwrap();
/// let settings = doc.add_section(web, "settings", SectionKind::NameValue).unwrap();
///
/// doc.properties_mut(settings).unwrap().add("mode", Some("debug"), None).unwrap();
/// assert_eq!(
///     doc.properties(settings).unwrap().get_value("mode").unwrap().as_deref(),
///     Some("debug")
/// );
/// doc.check_consistency().unwrap();
/// ```
pub struct ConfigDocument {
    dom: Dom,
    root: NodeId,
    registry: DeclarationRegistry,
    sink: Option<Box<dyn PersistenceSink>>,
    dirty: bool,
}

impl fmt::Debug for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDocument")
            .field("root", &self.root)
            .field("nodes", &self.dom.live_count())
            .field("has_sink", &self.sink.is_some())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDocument {
    /// Creates an empty document: a root with an empty `configSections` block
    pub fn new() -> Self {
        let mut dom = Dom::new();
        let root = dom.create_element(CONFIGURATION);
        let container = dom.create_element(CONFIG_SECTIONS);
        // Both nodes are fresh and detached
        let _ = dom.append_child(root, container);
        Self {
            dom,
            root,
            registry: DeclarationRegistry::new(container),
            sink: None,
            dirty: false,
        }
    }

    /// Parses and validates a configuration document.
    ///
    /// A missing `configSections` block is created as the root's first child.
    ///
    /// # Errors
    /// - `DomError::MalformedXml` if the text is not well-formed
    /// - `RegistryError::MalformedDocument` if the root is not `configuration`
    /// - `RegistryError::UnsupportedFeature` if any element carries a foreign
    ///   protection provider attribute
    /// - `RegistryError::Incongruent` if declarations and content disagree
    pub fn parse(xml: &str) -> Result<Self> {
        let (mut dom, root) = dom::parse::parse_document(xml)?;
        let root_name = dom.name(root)?;
        if root_name != CONFIGURATION {
            warn!(root = root_name, "rejected document with unexpected root element");
            return Err(RegistryError::MalformedDocument {
                reason: format!("root element is '{root_name}', expected '{CONFIGURATION}'"),
            }
            .into());
        }

        let container = match dom.find_child(root, CONFIG_SECTIONS)? {
            Some(container) => container,
            None => {
                let container = dom.create_element(CONFIG_SECTIONS);
                dom.insert_child(root, 0, container)?;
                container
            }
        };

        let doc = Self {
            dom,
            root,
            registry: DeclarationRegistry::new(container),
            sink: None,
            dirty: false,
        };
        doc.reject_foreign_protection()?;
        doc.check_consistency().inspect_err(|err| {
            warn!(error = %err, "rejected incongruent configuration document");
        })?;
        debug!(nodes = doc.dom.live_count(), "parsed configuration document");
        Ok(doc)
    }

    fn reject_foreign_protection(&self) -> Result<()> {
        for node in self.dom.descendants(self.root)? {
            if !self.dom.is_element(node) {
                continue;
            }
            if self.dom.attribute(node, ATTR_FOREIGN_PROTECTION)?.is_some() {
                let location = self.dom.name(node)?.to_string();
                warn!(%location, "rejected document protected by a foreign provider");
                return Err(RegistryError::UnsupportedFeature {
                    feature: ATTR_FOREIGN_PROTECTION.to_string(),
                    location,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Serializes the document in canonical form, with an XML declaration
    pub fn to_xml(&self) -> Result<String> {
        Ok(dom::render::render_document(&self.dom, self.root)?)
    }

    /// Read access to the node arena
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub(crate) fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    /// The declaration tree accessor
    pub fn registry(&self) -> &DeclarationRegistry {
        &self.registry
    }

    /// The root group (the `configuration` element)
    pub fn root_group(&self) -> GroupHandle {
        GroupHandle(self.root)
    }

    /// Flattened list of every declaration, depth first
    pub fn declarations(&self) -> Result<Vec<DeclarationEntry>> {
        self.registry.entries(&self.dom)
    }

    // --- Structural mutation ---

    /// Adds a section group named `name` under `parent`.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateName` if a group or section with that name
    ///   already exists at this level
    /// - `RegistryError::InvalidName` for empty, reserved or non-XML names
    pub fn add_group(&mut self, parent: GroupHandle, name: impl AsRef<str>) -> Result<GroupHandle> {
        let name = name.as_ref();
        let (parent_path, level) = self.prepare_insert(parent, name)?;

        let decl = self.registry.declare_group(&mut self.dom, level, name)?;
        let content = self.attach_content(parent, decl, name)?;

        debug!(path = %parent_path.join(name), "added section group");
        self.commit()?;
        Ok(GroupHandle(content))
    }

    /// Adds a section of the given kind named `name` under `parent`.
    ///
    /// The declaration's handler type comes from [`SectionKind::handler_type`].
    pub fn add_section(
        &mut self,
        parent: GroupHandle,
        name: impl AsRef<str>,
        kind: SectionKind,
    ) -> Result<SectionHandle> {
        let name = name.as_ref();
        let (parent_path, level) = self.prepare_insert(parent, name)?;

        let decl = self
            .registry
            .declare_section(&mut self.dom, level, name, kind.handler_type())?;
        let content = self.attach_content(parent, decl, name)?;

        debug!(path = %parent_path.join(name), kind = kind.name(), "added section");
        self.commit()?;
        Ok(SectionHandle(content))
    }

    /// Validates an insertion and returns the parent path and declaration level
    fn prepare_insert(&self, parent: GroupHandle, name: &str) -> Result<(ConfigPath, NodeId)> {
        let parent_path = self.group_path(parent)?;
        validate_name(&parent_path, name)?;
        let level = self.declaration_level(&parent_path)?;

        let declared = self.registry.lookup_in(&self.dom, level, name)?.is_some();
        let present = self.content_child(parent.0, name)?.is_some();
        if declared || present {
            return Err(RegistryError::DuplicateName {
                parent: parent_path.to_string(),
                name: name.to_string(),
            }
            .into());
        }
        Ok((parent_path, level))
    }

    /// Appends the content element for a new declaration, removing the
    /// declaration again if the content cannot be attached.
    fn attach_content(&mut self, parent: GroupHandle, decl: NodeId, name: &str) -> Result<NodeId> {
        let content = self.dom.create_element(name);
        if let Err(err) = self.dom.append_child(parent.0, content) {
            self.dom.remove(content)?;
            self.dom.remove(decl)?;
            return Err(err.into());
        }
        Ok(content)
    }

    /// Removes the group `name` under `parent` together with everything below it.
    ///
    /// Descendants are removed depth first before the group's own declaration
    /// and content. Comments attached to removed content go with it.
    pub fn remove_group(&mut self, parent: GroupHandle, name: impl AsRef<str>) -> Result<()> {
        self.remove_entry(parent, name.as_ref(), DeclarationKind::Group)
    }

    /// Removes the section `name` under `parent`
    pub fn remove_section(&mut self, parent: GroupHandle, name: impl AsRef<str>) -> Result<()> {
        self.remove_entry(parent, name.as_ref(), DeclarationKind::Section)
    }

    fn remove_entry(&mut self, parent: GroupHandle, name: &str, expected: DeclarationKind) -> Result<()> {
        let parent_path = self.group_path(parent)?;
        let not_found = || RegistryError::NotFound {
            parent: parent_path.to_string(),
            name: name.to_string(),
        };
        let level = self.registry.level(&self.dom, &parent_path)?.ok_or_else(not_found)?;
        let decl = self.registry.lookup_in(&self.dom, level, name)?.ok_or_else(not_found)?;

        let actual = if is_group(&self.dom, decl)? {
            DeclarationKind::Group
        } else {
            DeclarationKind::Section
        };
        if actual != expected {
            return Err(RegistryError::WrongNodeKind {
                name: name.to_string(),
                expected: expected.as_str(),
                actual: actual.as_str(),
            }
            .into());
        }

        let content = self.content_child(parent.0, name)?;
        self.remove_pair(&parent_path, decl, content)?;
        self.commit()
    }

    fn remove_pair(&mut self, parent_path: &ConfigPath, decl: NodeId, content: Option<NodeId>) -> Result<()> {
        let path = parent_path.join(declared_name(&self.dom, decl, parent_path)?);
        if is_group(&self.dom, decl)? {
            for child in self.registry.children(&self.dom, decl)? {
                let child_name = declared_name(&self.dom, child, &path)?;
                let child_content = match content {
                    Some(content) => self.content_child(content, &child_name)?,
                    None => None,
                };
                self.remove_pair(&path, child, child_content)?;
            }
        }
        if let Some(content) = content {
            comment::remove_attached(&mut self.dom, content)?;
            self.dom.remove(content)?;
        }
        self.dom.remove(decl)?;
        debug!(%path, "removed declaration and content");
        Ok(())
    }

    // --- Built-in sections ---

    /// Creates a built-in section at the root.
    ///
    /// Built-ins have no declaration; they are recognised by element name.
    pub fn add_builtin(&mut self, builtin: BuiltinSection) -> Result<SectionHandle> {
        let name = builtin.element_name();
        let declared = self
            .registry
            .lookup_in(&self.dom, self.registry.container(), name)?
            .is_some();
        if declared || self.content_child(self.root, name)?.is_some() {
            return Err(RegistryError::DuplicateName {
                parent: ConfigPath::root().to_string(),
                name: name.to_string(),
            }
            .into());
        }
        let content = self.dom.create_element(name);
        self.dom.append_child(self.root, content)?;
        debug!(section = name, "added built-in section");
        self.commit()?;
        Ok(SectionHandle(content))
    }

    /// Finds a built-in section, declared or not
    pub fn builtin(&self, builtin: BuiltinSection) -> Result<Option<SectionHandle>> {
        Ok(self
            .find(self.root_group(), builtin.element_name())?
            .and_then(|node| node.as_section()))
    }

    /// Removes a built-in section, declared or not
    pub fn remove_builtin(&mut self, builtin: BuiltinSection) -> Result<()> {
        let name = builtin.element_name();
        let container = self.registry.container();
        if self.registry.lookup_in(&self.dom, container, name)?.is_some() {
            return self.remove_section(self.root_group(), name);
        }
        let content = self.content_child(self.root, name)?.ok_or_else(|| RegistryError::NotFound {
            parent: ConfigPath::root().to_string(),
            name: name.to_string(),
        })?;
        comment::remove_attached(&mut self.dom, content)?;
        self.dom.remove(content)?;
        debug!(section = name, "removed built-in section");
        self.commit()
    }

    // --- Lookup ---

    /// Finds the group or section named `name` directly under `parent`
    pub fn find(&self, parent: GroupHandle, name: impl AsRef<str>) -> Result<Option<ConfigNode>> {
        let name = name.as_ref();
        let parent_path = self.group_path(parent)?;
        let Some(content) = self.content_child(parent.0, name)? else {
            return Ok(None);
        };
        match self.registry.lookup(&self.dom, &parent_path, name)? {
            Some(decl) if is_group(&self.dom, decl)? => Ok(Some(ConfigNode::Group(GroupHandle(content)))),
            Some(_) => Ok(Some(ConfigNode::Section(SectionHandle(content)))),
            None if parent_path.is_root() && BuiltinSection::from_element_name(name).is_some() => {
                Ok(Some(ConfigNode::Section(SectionHandle(content))))
            }
            None => Ok(None),
        }
    }

    /// Resolves a path from the root. The root path resolves to the root group.
    pub fn resolve(&self, path: &ConfigPath) -> Result<Option<ConfigNode>> {
        let mut current = ConfigNode::Group(self.root_group());
        for segment in path.segments() {
            let Some(group) = current.as_group() else {
                return Ok(None);
            };
            match self.find(group, segment)? {
                Some(node) => current = node,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Child groups of `parent` in content order
    pub fn groups(&self, parent: GroupHandle) -> Result<Vec<GroupHandle>> {
        Ok(self.children_of(parent)?.into_iter().filter_map(|n| n.as_group()).collect())
    }

    /// Child sections of `parent` in content order
    pub fn sections(&self, parent: GroupHandle) -> Result<Vec<SectionHandle>> {
        Ok(self
            .children_of(parent)?
            .into_iter()
            .filter_map(|n| n.as_section())
            .collect())
    }

    fn children_of(&self, parent: GroupHandle) -> Result<Vec<ConfigNode>> {
        let mut out = Vec::new();
        for child in self.dom.child_elements(parent.0)? {
            if child == self.registry.container() {
                continue;
            }
            if let Some(node) = self.find(parent, self.dom.name(child)?)?
                && node.node() == child
            {
                out.push(node);
            }
        }
        Ok(out)
    }

    /// Path of a group or section from the root
    pub fn path_of(&self, node: impl Into<ConfigNode>) -> Result<ConfigPath> {
        let node = node.into();
        let actual = self.classify(node.node())?;
        if actual.kind_name() != node.kind_name() {
            return Err(RegistryError::WrongNodeKind {
                name: self.dom.name(node.node())?.to_string(),
                expected: node.kind_name(),
                actual: actual.kind_name(),
            }
            .into());
        }
        self.content_path(node.node())
    }

    /// Name of a section (the last segment of its path)
    pub fn section_name(&self, section: SectionHandle) -> Result<String> {
        self.classify_section(section)?;
        Ok(self.dom.name(section.0)?.to_string())
    }

    /// The kind of a section, decided by its declaration's handler type
    pub fn section_kind(&self, section: SectionHandle) -> Result<SectionKind> {
        let path = self.section_path(section)?;
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(RegistryError::NotInDocument { node: section.0 }.into());
        };
        match self.registry.lookup(&self.dom, &parent, name)? {
            Some(decl) => {
                let handler = self.dom.attribute(decl, ATTR_TYPE)?.unwrap_or_default();
                Ok(SectionKind::from_handler_type(handler))
            }
            None => BuiltinSection::from_element_name(name)
                .map(|builtin| builtin.kind())
                .ok_or_else(|| RegistryError::NotInDocument { node: section.0 }.into()),
        }
    }

    /// Canonical serialized form of one section
    pub fn render(&self, section: SectionHandle) -> Result<String> {
        self.classify_section(section)?;
        Ok(dom::render::render_node(&self.dom, section.0)?)
    }

    /// Returns true if the node's children are currently an encrypted payload
    pub fn is_protected(&self, node: impl Into<NodeId>) -> Result<bool> {
        let node = node.into();
        Ok(self.dom.attribute(node, ATTR_PROTECTED)? == Some("true"))
    }

    /// Verifies that declarations and content are in one-to-one correspondence.
    ///
    /// Every declaration must have exactly one content element at the same
    /// path, and every content element below the root (other than
    /// `configSections` and undeclared built-ins) must be declared.
    pub fn check_consistency(&self) -> Result<()> {
        self.check_level(&ConfigPath::root(), self.registry.container(), self.root)
    }

    fn check_level(&self, path: &ConfigPath, level: NodeId, content: NodeId) -> Result<()> {
        let incongruent = |at: &ConfigPath, reason: String| -> crate::Error {
            RegistryError::Incongruent {
                path: at.to_string(),
                reason,
            }
            .into()
        };

        let mut declared = HashSet::new();
        for decl in self.registry.children(&self.dom, level)? {
            let name = declared_name(&self.dom, decl, path)?;
            let child_path = path.join(name.clone());
            if !declared.insert(name.clone()) {
                return Err(incongruent(&child_path, "declared more than once".to_string()));
            }
            let Some(child) = self.content_child(content, &name)? else {
                return Err(incongruent(&child_path, "declared but has no content".to_string()));
            };
            if is_group(&self.dom, decl)? {
                self.check_level(&child_path, decl, child)?;
            }
        }

        let mut seen = HashSet::new();
        for child in self.dom.child_elements(content)? {
            if child == self.registry.container() {
                continue;
            }
            let name = self.dom.name(child)?;
            let child_path = path.join(name);
            if !seen.insert(name) {
                return Err(incongruent(&child_path, "content element appears more than once".to_string()));
            }
            let builtin = path.is_root() && BuiltinSection::from_element_name(name).is_some();
            if !declared.contains(name) && !builtin {
                return Err(incongruent(&child_path, "content has no declaration".to_string()));
            }
        }
        Ok(())
    }

    // --- Persistence ---

    /// Registers the sink invoked after each successful mutation
    pub fn set_persistence(&mut self, sink: Box<dyn PersistenceSink>) {
        self.sink = Some(sink);
    }

    /// Unregisters and returns the current sink
    pub fn take_persistence(&mut self) -> Option<Box<dyn PersistenceSink>> {
        self.sink.take()
    }

    /// Returns true if the document changed since it was loaded or last saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the document to the registered sink
    pub fn save(&mut self) -> Result<()> {
        let xml = self.to_xml()?;
        let sink = self.sink.as_mut().ok_or(PersistenceError::NoSink)?;
        sink.save(&xml)?;
        self.dirty = false;
        info!(bytes = xml.len(), "saved configuration document");
        Ok(())
    }

    /// Marks a successful mutation and runs auto-save.
    ///
    /// A failing sink leaves the mutation applied and the document dirty.
    pub(crate) fn commit(&mut self) -> Result<()> {
        self.dirty = true;
        if self.sink.as_ref().is_some_and(|sink| sink.auto_save()) {
            self.save()?;
        }
        Ok(())
    }

    // --- Internal lookups ---

    /// First child element of `parent` named `name`
    fn content_child(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>> {
        Ok(self.dom.find_child(parent, name)?)
    }

    fn declaration_level(&self, path: &ConfigPath) -> Result<NodeId> {
        self.registry.level(&self.dom, path)?.ok_or_else(|| {
            RegistryError::Incongruent {
                path: path.to_string(),
                reason: "group has no declaration".to_string(),
            }
            .into()
        })
    }

    /// Names of the content elements from the root down to `node`
    fn content_path(&self, node: NodeId) -> Result<ConfigPath> {
        let mut names = Vec::new();
        let mut current = node;
        while current != self.root {
            names.push(self.dom.name(current)?.to_string());
            current = self
                .dom
                .parent(current)?
                .ok_or(RegistryError::NotInDocument { node })?;
        }
        names.reverse();
        Ok(ConfigPath::from_segments(names))
    }

    /// Decides whether a content element is a group or a section of this document
    pub(crate) fn classify(&self, node: NodeId) -> Result<ConfigNode> {
        if node == self.root {
            return Ok(ConfigNode::Group(GroupHandle(node)));
        }
        let name = self.dom.name(node)?;
        let parent = self
            .dom
            .parent(node)?
            .ok_or(RegistryError::NotInDocument { node })?;
        match self.find(GroupHandle(parent), name) {
            Ok(Some(found)) if found.node() == node => Ok(found),
            _ => Err(RegistryError::NotInDocument { node }.into()),
        }
    }

    pub(crate) fn group_path(&self, group: GroupHandle) -> Result<ConfigPath> {
        self.path_of(group)
    }

    pub(crate) fn section_path(&self, section: SectionHandle) -> Result<ConfigPath> {
        self.path_of(section)
    }

    pub(crate) fn classify_section(&self, section: SectionHandle) -> Result<()> {
        self.path_of(section).map(|_| ())
    }
}

/// Checks that `name` can be used for a new group or section under `parent`
fn validate_name(parent: &ConfigPath, name: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
        .into())
    };
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return invalid("name must not be empty");
    };
    if !(first.is_alphabetic() || first == '_') {
        return invalid("name must start with a letter or underscore");
    }
    if !chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return invalid("name may only contain letters, digits, '_', '-' and '.'");
    }
    if parent.is_root() && name == CONFIG_SECTIONS {
        return invalid("name is reserved for the declaration block");
    }
    Ok(())
}
