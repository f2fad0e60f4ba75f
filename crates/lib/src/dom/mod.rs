//! Arena-backed XML node storage.
//!
//! Every node of a configuration document (elements, comments and text) lives
//! in a single [`Dom`] arena and is addressed by a [`NodeId`]. Handles are
//! stable for the lifetime of the node they name: when a node is removed its
//! slot is recycled under a new generation, so an old handle can never alias
//! the replacement.
//!
//! Parent and sibling relationships are plain lookups. Ownership always flows
//! downward through `Element::children`.
//!
//! ```
//! use cfgdoc::dom::Dom;
//!
//! let mut dom = Dom::new();
//! let root = dom.create_element("configuration");
//! let child = dom.create_element("appSettings");
//! dom.append_child(root, child).unwrap();
//!
//! assert_eq!(dom.parent(child).unwrap(), Some(root));
//! dom.remove(child).unwrap();
//! assert!(!dom.contains(child));
//! ```

use std::fmt;

mod errors;
pub mod parse;
pub mod render;

pub use errors::DomError;

/// Result type for arena operations.
pub type DomResult<T> = std::result::Result<T, DomError>;

/// Stable handle to a node in a [`Dom`].
///
/// Equality and hashing compare the handle itself, never the node content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
}

impl Element {
    /// Qualified tag name, including any namespace prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Child handles in document order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Comment(String),
    Text(String),
}

impl NodeData {
    /// Returns the node kind as a string
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::Element(_) => "element",
            NodeData::Comment(_) => "comment",
            NodeData::Text(_) => "text",
        }
    }
}

/// Returns true if `c` is in the XML 1.0 `Char` production
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// First character of `text` that no XML document can contain
pub fn find_invalid_char(text: &str) -> Option<char> {
    text.chars().find(|c| !is_xml_char(*c))
}

/// In-scope namespace declarations (`xmlns`, `xmlns:*`) of `id`, nearest binding first.
///
/// Walks from the node up through its ancestors; a prefix declared on a
/// nearer element shadows the same prefix further up.
pub fn namespace_bindings(dom: &Dom, id: NodeId) -> DomResult<Vec<(String, String)>> {
    let mut bindings: Vec<(String, String)> = Vec::new();
    let mut current = Some(id);
    while let Some(node) = current {
        for (name, value) in dom.element(node)?.attributes() {
            let is_binding = name == "xmlns" || name.starts_with("xmlns:");
            if is_binding && !bindings.iter().any(|(n, _)| n == name) {
                bindings.push((name.clone(), value.clone()));
            }
        }
        current = dom.parent(node)?;
    }
    Ok(bindings)
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    data: NodeData,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Generational arena holding every node of a document.
#[derive(Debug, Default)]
pub struct Dom {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Dom {
    /// Creates an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes, attached or not
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns true if the handle still names a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node { parent: None, data };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Creates a detached element with no attributes or children
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Element(Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }))
    }

    /// Creates a detached comment node
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    /// Creates a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(DomError::StaleHandle { node: id })
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(DomError::StaleHandle { node: id })
    }

    /// Gets the payload of a node
    pub fn data(&self, id: NodeId) -> DomResult<&NodeData> {
        Ok(&self.node(id)?.data)
    }

    /// Gets a node as an element
    pub fn element(&self, id: NodeId) -> DomResult<&Element> {
        match &self.node(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(DomError::NotAnElement { node: id }),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut Element> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(DomError::NotAnElement { node: id }),
        }
    }

    /// Returns true if the node is a live element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_ok()
    }

    /// Gets the tag name of an element
    pub fn name(&self, id: NodeId) -> DomResult<&str> {
        Ok(self.element(id)?.name())
    }

    /// Gets the children of an element
    pub fn children(&self, id: NodeId) -> DomResult<&[NodeId]> {
        Ok(self.element(id)?.children())
    }

    /// Gets the element children of an element, skipping comments and text
    pub fn child_elements(&self, id: NodeId) -> DomResult<Vec<NodeId>> {
        Ok(self
            .children(id)?
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect())
    }

    /// Finds the first child element with the given tag name
    pub fn find_child(&self, id: NodeId, name: &str) -> DomResult<Option<NodeId>> {
        Ok(self
            .children(id)?
            .iter()
            .copied()
            .find(|child| self.name(*child).is_ok_and(|n| n == name)))
    }

    /// Gets the parent of a node
    pub fn parent(&self, id: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Gets the position of a node within its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> DomResult<Option<usize>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        Ok(self.children(parent)?.iter().position(|c| *c == id))
    }

    /// Gets the node immediately preceding this one under the same parent
    pub fn previous_sibling(&self, id: NodeId) -> DomResult<Option<NodeId>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        let siblings = self.children(parent)?;
        Ok(siblings
            .iter()
            .position(|c| *c == id)
            .and_then(|pos| pos.checked_sub(1))
            .map(|pos| siblings[pos]))
    }

    /// Gets an attribute value by name
    pub fn attribute(&self, id: NodeId, name: &str) -> DomResult<Option<&str>> {
        Ok(self
            .element(id)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str()))
    }

    /// Sets an attribute, replacing the value in place if it already exists
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> DomResult<()> {
        let name = name.into();
        let value = value.into();
        let element = self.element_mut(id)?;
        match element.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => element.attributes.push((name, value)),
        }
        Ok(())
    }

    /// Removes an attribute, returning its previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let element = self.element_mut(id)?;
        Ok(element
            .attributes
            .iter()
            .position(|(k, _)| k == name)
            .map(|pos| element.attributes.remove(pos).1))
    }

    /// Gets the text of a node.
    ///
    /// For elements this is the concatenation of the direct text children;
    /// for comment and text nodes it is the node's own content.
    pub fn text(&self, id: NodeId) -> DomResult<String> {
        match &self.node(id)?.data {
            NodeData::Element(element) => Ok(element
                .children
                .iter()
                .filter_map(|child| match self.data(*child) {
                    Ok(NodeData::Text(text)) => Some(text.as_str()),
                    _ => None,
                })
                .collect()),
            NodeData::Comment(text) | NodeData::Text(text) => Ok(text.clone()),
        }
    }

    /// Replaces the content of a comment or text node in place
    pub fn set_node_text(&mut self, id: NodeId, value: impl Into<String>) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Comment(text) | NodeData::Text(text) => {
                *text = value.into();
                Ok(())
            }
            NodeData::Element(_) => Err(DomError::NotAnElement { node: id }),
        }
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.element(parent)?;
        if self.parent(child)?.is_some() {
            return Err(DomError::AlreadyAttached { node: child });
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(DomError::WouldCycle { parent, child });
            }
            cursor = self.parent(current)?;
        }
        Ok(())
    }

    /// Appends a detached node as the last child of an element
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_attachable(parent, child)?;
        self.element_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Inserts a detached node at `index` among an element's children
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> DomResult<()> {
        self.check_attachable(parent, child)?;
        let len = self.children(parent)?.len();
        if index > len {
            return Err(DomError::IndexOutOfBounds { index, len });
        }
        self.element_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Inserts a detached node immediately before `sibling`
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) -> DomResult<()> {
        let parent = self
            .parent(sibling)?
            .ok_or(DomError::Detached { node: sibling })?;
        let index = self
            .index_in_parent(sibling)?
            .ok_or(DomError::Detached { node: sibling })?;
        self.insert_child(parent, index, node)
    }

    /// Detaches a node from its parent, keeping it alive in the arena
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let Some(parent) = self.parent(id)? else {
            return Ok(());
        };
        self.element_mut(parent)?.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Detaches a node and frees it together with all of its descendants
    pub fn remove(&mut self, id: NodeId) -> DomResult<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                if let NodeData::Element(element) = node.data {
                    stack.extend(element.children);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
        Ok(())
    }

    /// Removes every child of an element
    pub fn clear_children(&mut self, id: NodeId) -> DomResult<()> {
        let children = self.children(id)?.to_vec();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Collects a node and all its descendants in document order
    pub fn descendants(&self, id: NodeId) -> DomResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let NodeData::Element(element) = self.data(current)? {
                stack.extend(element.children.iter().rev());
            }
        }
        Ok(out)
    }
}
