//! Comment slots.
//!
//! Any group, section, property entry or native node can own at most one
//! comment: the comment node immediately preceding it among its siblings.
//! Comments never take part in handle equality.

use thiserror::Error;
use tracing::debug;

use crate::{
    ConfigDocument, Result,
    dom::{Dom, NodeData, NodeId, find_invalid_char},
};

/// Errors raised by comment slot operations
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CommentError {
    /// The slot is empty
    #[error("Node {owner} has no comment")]
    NoComment { owner: NodeId },

    /// The text cannot be stored in an XML comment
    #[error("Invalid comment text: {reason}")]
    InvalidText { reason: String },
}

impl CommentError {
    /// Check if this error indicates an empty slot
    pub fn is_not_found(&self) -> bool {
        matches!(self, CommentError::NoComment { .. })
    }

    /// Check if this error was caused by a bad argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CommentError::InvalidText { .. })
    }
}

impl From<CommentError> for crate::Error {
    fn from(err: CommentError) -> Self {
        crate::Error::Comment(err)
    }
}

/// Checks that `text` can be written as an XML comment
pub(crate) fn validate(text: &str) -> Result<()> {
    if text.contains("--") {
        return Err(CommentError::InvalidText {
            reason: "comments may not contain '--'".to_string(),
        }
        .into());
    }
    if text.ends_with('-') {
        return Err(CommentError::InvalidText {
            reason: "comments may not end with '-'".to_string(),
        }
        .into());
    }
    // Line-end normalization rewrites '\r' on load and comments cannot escape it
    if let Some(c) = find_invalid_char(text).or_else(|| text.contains('\r').then_some('\r')) {
        return Err(CommentError::InvalidText {
            reason: format!("character U+{:04X} cannot be stored in a comment", u32::from(c)),
        }
        .into());
    }
    Ok(())
}

/// The comment node attached to `owner`, if any
pub(crate) fn attached(dom: &Dom, owner: NodeId) -> Result<Option<NodeId>> {
    match dom.previous_sibling(owner)? {
        Some(prev) if matches!(dom.data(prev)?, NodeData::Comment(_)) => Ok(Some(prev)),
        _ => Ok(None),
    }
}

/// Inserts a new comment directly before an attached `owner`
pub(crate) fn attach(dom: &mut Dom, owner: NodeId, text: &str) -> Result<NodeId> {
    let node = dom.create_comment(text);
    if let Err(err) = dom.insert_before(owner, node) {
        dom.remove(node)?;
        return Err(err.into());
    }
    Ok(node)
}

/// Removes the comment attached to `owner`, if any
pub(crate) fn remove_attached(dom: &mut Dom, owner: NodeId) -> Result<()> {
    if let Some(node) = attached(dom, owner)? {
        dom.remove(node)?;
    }
    Ok(())
}

/// Read view of a node's comment slot
#[derive(Debug)]
pub struct CommentSlot<'a> {
    dom: &'a Dom,
    owner: NodeId,
}

impl<'a> CommentSlot<'a> {
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// The comment text.
    ///
    /// # Errors
    /// `CommentError::NoComment` if the slot is empty.
    pub fn value(&self) -> Result<String> {
        self.try_value()?
            .ok_or_else(|| CommentError::NoComment { owner: self.owner }.into())
    }

    /// The comment text, or `None` if the slot is empty
    pub fn try_value(&self) -> Result<Option<String>> {
        match attached(self.dom, self.owner)? {
            Some(node) => Ok(Some(self.dom.text(node)?)),
            None => Ok(None),
        }
    }

    pub fn has_value(&self) -> Result<bool> {
        Ok(attached(self.dom, self.owner)?.is_some())
    }

    /// The comment node itself; its handle survives text updates
    pub fn node(&self) -> Result<Option<NodeId>> {
        attached(self.dom, self.owner)
    }
}

/// Mutable view of a node's comment slot
#[derive(Debug)]
pub struct CommentSlotMut<'a> {
    doc: &'a mut ConfigDocument,
    owner: NodeId,
}

impl<'a> CommentSlotMut<'a> {
    pub fn view(&self) -> CommentSlot<'_> {
        CommentSlot {
            dom: self.doc.dom(),
            owner: self.owner,
        }
    }

    /// Sets or clears the comment.
    ///
    /// `None` removes an existing comment and is a no-op on an empty slot.
    /// Text on an empty slot inserts a comment directly before the owner;
    /// text on a filled slot replaces the text of the existing node.
    pub fn set_value(&mut self, text: Option<&str>) -> Result<()> {
        let existing = attached(self.doc.dom(), self.owner)?;
        match (text, existing) {
            (None, None) => return Ok(()),
            (None, Some(node)) => {
                self.doc.dom_mut().remove(node)?;
                debug!(owner = %self.owner, "removed comment");
            }
            (Some(text), Some(node)) => {
                validate(text)?;
                if self.doc.dom().text(node)? == text {
                    return Ok(());
                }
                self.doc.dom_mut().set_node_text(node, text)?;
                debug!(owner = %self.owner, "updated comment");
            }
            (Some(text), None) => {
                validate(text)?;
                attach(self.doc.dom_mut(), self.owner, text)?;
                debug!(owner = %self.owner, "added comment");
            }
        }
        self.doc.commit()
    }

    /// Removes the comment if present
    pub fn remove(&mut self) -> Result<()> {
        self.set_value(None)
    }
}

impl ConfigDocument {
    /// Checks that `owner` is attached below the root, where a sibling comment can live
    fn comment_owner(&self, owner: NodeId) -> Result<NodeId> {
        self.dom().element(owner)?;
        if owner == self.root_group().node() || self.dom().parent(owner)?.is_none() {
            return Err(crate::document::RegistryError::NotInDocument { node: owner }.into());
        }
        Ok(owner)
    }

    /// Read view of the comment slot of any element below the root
    pub fn comment(&self, owner: impl Into<NodeId>) -> Result<CommentSlot<'_>> {
        let owner = self.comment_owner(owner.into())?;
        Ok(CommentSlot {
            dom: self.dom(),
            owner,
        })
    }

    /// Mutable view of the comment slot of any element below the root
    pub fn comment_mut(&mut self, owner: impl Into<NodeId>) -> Result<CommentSlotMut<'_>> {
        let owner = self.comment_owner(owner.into())?;
        Ok(CommentSlotMut { doc: self, owner })
    }
}
