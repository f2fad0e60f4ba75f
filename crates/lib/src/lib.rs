//!
//! cfgdoc: a mutable, strongly-typed object model for .NET-style application
//! configuration files (`app.config`, `web.config`, `machine.config`).
//!
//! ## Core Concepts
//!
//! * **Document (`document::ConfigDocument`)**: owns every node of a configuration file and is the
//!   single entry point for mutation.
//! * **Declaration tree (`document::DeclarationRegistry`)**: the `configSections` block naming each
//!   section group and section together with its handler type. It is kept congruent with the
//!   content tree on every add and remove.
//! * **Sections (`section::SectionKind`)**: typed content nodes. Most carry a
//!   **PropertySet (`section::PropertySet`)** of ordered Add/Remove/Clear directives, some carry
//!   text, and the native kinds carry a recursive dictionary/list/string tree
//!   (`section::NativeTree`).
//! * **Comments (`comment::CommentSlot`)**: a single optional comment directly preceding any node.
//! * **Protection (`protection`)**: reversible replacement of a section's children by an
//!   encrypted, self-describing payload.
//! * **Persistence (`persistence::PersistenceSink`)**: an optional caller-supplied hook invoked
//!   after each successful mutation.
//!
//! Nodes live in an arena (`dom::Dom`) and are addressed by stable handles; equality of sections
//! and groups is handle identity, never content comparison.

pub mod comment;
pub mod constants;
pub mod document;
pub mod dom;
pub mod persistence;
pub mod protection;
pub mod section;

pub use document::{ConfigDocument, ConfigNode, ConfigPath, DeclarationEntry, GroupHandle, SectionHandle};
pub use persistence::{FileStore, PersistenceSink};
pub use protection::{ProtectionKey, ProtectionState};
pub use section::SectionKind;

/// Result type used throughout the cfgdoc library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the cfgdoc library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured arena and XML errors from the dom module
    #[error(transparent)]
    Dom(dom::DomError),

    /// Structured declaration/content tree errors from the document module
    #[error(transparent)]
    Registry(document::RegistryError),

    /// Structured section payload errors from the section module
    #[error(transparent)]
    Section(section::SectionError),

    /// Structured comment errors from the comment module
    #[error(transparent)]
    Comment(comment::CommentError),

    /// Structured encryption errors from the protection module
    #[error(transparent)]
    Protection(protection::ProtectionError),

    /// Structured persistence errors from the persistence module
    #[error(transparent)]
    Persistence(persistence::PersistenceError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Dom(_) => "dom",
            Error::Registry(_) => "document",
            Error::Section(_) => "section",
            Error::Comment(_) => "comment",
            Error::Protection(_) => "protection",
            Error::Persistence(_) => "persistence",
        }
    }

    /// Check if this error is a name or key collision.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Error::Registry(err) => err.is_duplicate(),
            Error::Section(err) => err.is_duplicate_key(),
            _ => false,
        }
    }

    /// Check if this error indicates a key, name or comment was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Registry(err) => err.is_not_found(),
            Error::Section(err) => err.is_not_found(),
            Error::Comment(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error was caused by an invalid or missing argument.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Error::Dom(err) => err.is_stale_handle() || err.is_structural_error(),
            Error::Registry(err) => err.is_invalid_argument(),
            Error::Section(err) => err.is_invalid_argument(),
            Error::Comment(err) => err.is_invalid_argument(),
            Error::Protection(err) => err.is_invalid_argument(),
            _ => false,
        }
    }

    /// Check if this error rejects a feature this library does not implement.
    pub fn is_unsupported_feature(&self) -> bool {
        match self {
            Error::Registry(err) => err.is_unsupported_feature(),
            _ => false,
        }
    }

    /// Check if this error is an illegal protection state change.
    pub fn is_invalid_state_transition(&self) -> bool {
        match self {
            Error::Protection(err) => err.is_invalid_state_transition(),
            _ => false,
        }
    }

    /// Check if this error is a failed encryption, decryption or payload decode.
    pub fn is_cryptographic_failure(&self) -> bool {
        match self {
            Error::Protection(err) => err.is_cryptographic_failure(),
            _ => false,
        }
    }

    /// Check if this error was raised because a node is protected.
    pub fn is_protected(&self) -> bool {
        match self {
            Error::Section(err) => err.is_protected(),
            _ => false,
        }
    }

    /// Check if this error came from reading a document.
    pub fn is_load_error(&self) -> bool {
        match self {
            Error::Dom(err) => err.is_parse_error(),
            Error::Registry(err) => err.is_load_error(),
            _ => false,
        }
    }

    /// Check if this error is persistence or I/O related.
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Persistence(_))
    }
}
