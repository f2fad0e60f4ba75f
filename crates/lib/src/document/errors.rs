//! Error types for the declaration and content trees.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised while mutating or loading the group/section dual tree.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A group or section with this name already exists at this level
    #[error("'{name}' already exists under '{parent}'")]
    DuplicateName {
        /// Path of the parent group
        parent: String,
        /// The colliding name
        name: String,
    },

    /// No group or section with this name exists at this level
    #[error("'{name}' not found under '{parent}'")]
    NotFound {
        /// Path of the parent group
        parent: String,
        /// The missing name
        name: String,
    },

    /// The name cannot be used for a group or section
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The named node exists but is of the other kind
    #[error("Expected a {expected} but '{name}' is a {actual}")]
    WrongNodeKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The handle does not refer to a group or section of this document
    #[error("Node {node} is not a group or section of this document")]
    NotInDocument { node: NodeId },

    /// The document uses a feature this library refuses to load
    #[error("Unsupported feature '{feature}' at '{location}'")]
    UnsupportedFeature { feature: String, location: String },

    /// The declaration tree and content tree are not congruent
    #[error("Declaration and content trees disagree at '{path}': {reason}")]
    Incongruent { path: String, reason: String },

    /// The document does not have the expected root structure
    #[error("Malformed configuration document: {reason}")]
    MalformedDocument { reason: String },
}

impl RegistryError {
    /// Check if this error is a name collision
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RegistryError::DuplicateName { .. })
    }

    /// Check if this error indicates a name was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    /// Check if this error was caused by a bad argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            RegistryError::InvalidName { .. }
                | RegistryError::WrongNodeKind { .. }
                | RegistryError::NotInDocument { .. }
        )
    }

    /// Check if this error rejects an unsupported feature
    pub fn is_unsupported_feature(&self) -> bool {
        matches!(self, RegistryError::UnsupportedFeature { .. })
    }

    /// Check if this error was raised while loading a document
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            RegistryError::UnsupportedFeature { .. }
                | RegistryError::Incongruent { .. }
                | RegistryError::MalformedDocument { .. }
        )
    }

    /// Get the name this error refers to, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            RegistryError::DuplicateName { name, .. }
            | RegistryError::NotFound { name, .. }
            | RegistryError::InvalidName { name, .. }
            | RegistryError::WrongNodeKind { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<RegistryError> for crate::Error {
    fn from(err: RegistryError) -> Self {
        crate::Error::Registry(err)
    }
}
