//! Error types for arena and XML operations.

use thiserror::Error;

use super::NodeId;

/// Structured error types for the node arena.
///
/// These errors describe structural misuse of the arena (stale handles,
/// illegal re-parenting) and failures to read XML text into it.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomError {
    /// The handle refers to a node that has been removed
    #[error("Stale node handle: {node}")]
    StaleHandle { node: NodeId },

    /// An element operation was attempted on a comment or text node
    #[error("Node {node} is not an element")]
    NotAnElement { node: NodeId },

    /// The node already has a parent and must be detached first
    #[error("Node {node} is already attached to a parent")]
    AlreadyAttached { node: NodeId },

    /// The node has no parent, so sibling operations are meaningless
    #[error("Node {node} is not attached to a parent")]
    Detached { node: NodeId },

    /// Attaching the node would make it its own ancestor
    #[error("Attaching node {child} under {parent} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },

    /// Child index outside the parent's child list
    #[error("Child index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The input text is not well-formed XML
    #[error("Malformed XML: {reason}")]
    MalformedXml { reason: String },
}

impl DomError {
    /// Check if this error was caused by a handle outliving its node
    pub fn is_stale_handle(&self) -> bool {
        matches!(self, DomError::StaleHandle { .. })
    }

    /// Check if this error came from reading XML text
    pub fn is_parse_error(&self) -> bool {
        matches!(self, DomError::MalformedXml { .. })
    }

    /// Check if this error is a structural misuse of the arena
    pub fn is_structural_error(&self) -> bool {
        matches!(
            self,
            DomError::NotAnElement { .. }
                | DomError::AlreadyAttached { .. }
                | DomError::Detached { .. }
                | DomError::WouldCycle { .. }
                | DomError::IndexOutOfBounds { .. }
        )
    }

    /// Get the node handle this error refers to, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            DomError::StaleHandle { node }
            | DomError::NotAnElement { node }
            | DomError::AlreadyAttached { node }
            | DomError::Detached { node } => Some(*node),
            DomError::WouldCycle { child, .. } => Some(*child),
            _ => None,
        }
    }
}

impl From<DomError> for crate::Error {
    fn from(err: DomError) -> Self {
        crate::Error::Dom(err)
    }
}
