//! Error types for section payload operations.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised by text, property set and native tree operations.
///
/// `section` fields hold the section's path.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SectionError {
    /// An Add directive for this key is already live
    #[error("Duplicate key in section '{section}': {key}")]
    DuplicateKey { section: String, key: String },

    /// The key is absent after folding all directives
    #[error("Key not found in section '{section}': {key}")]
    KeyNotFound { section: String, key: String },

    /// The key is present but carries no value
    #[error("Key '{key}' in section '{section}' has no value")]
    ValueMissing { section: String, key: String },

    /// The section kind does not accept this directive
    #[error("Directive '{directive}' is not allowed in section '{section}'")]
    DirectiveNotAllowed {
        section: String,
        directive: &'static str,
    },

    /// Keys must be non-empty
    #[error("Empty key in section '{section}'")]
    EmptyKey { section: String },

    /// The text cannot be stored in the document without changing it
    #[error("Invalid value in section '{section}': {reason}")]
    InvalidValue { section: String, reason: String },

    /// Raw entry index past the end
    #[error("Index {index} out of bounds for section '{section}' with {len} entries")]
    IndexOutOfBounds {
        section: String,
        index: usize,
        len: usize,
    },

    /// The payload is encrypted and must be decrypted first
    #[error("Section '{section}' is protected")]
    Protected { section: String },

    /// The operation does not apply to this section kind
    #[error("Section '{section}' is {actual}, expected {expected}")]
    KindMismatch {
        section: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A native tree node does not have the expected shape
    #[error("Malformed native node {node}: {reason}")]
    MalformedNative { node: NodeId, reason: String },
}

impl SectionError {
    /// Check if this error is a key collision
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, SectionError::DuplicateKey { .. })
    }

    /// Check if this error indicates a key was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, SectionError::KeyNotFound { .. })
    }

    /// Check if this error was caused by a bad argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            SectionError::ValueMissing { .. }
                | SectionError::DirectiveNotAllowed { .. }
                | SectionError::EmptyKey { .. }
                | SectionError::InvalidValue { .. }
                | SectionError::IndexOutOfBounds { .. }
                | SectionError::KindMismatch { .. }
                | SectionError::MalformedNative { .. }
        )
    }

    /// Check if this error was raised because the payload is encrypted
    pub fn is_protected(&self) -> bool {
        matches!(self, SectionError::Protected { .. })
    }

    /// Get the key this error refers to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            SectionError::DuplicateKey { key, .. }
            | SectionError::KeyNotFound { key, .. }
            | SectionError::ValueMissing { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<SectionError> for crate::Error {
    fn from(err: SectionError) -> Self {
        crate::Error::Section(err)
    }
}
