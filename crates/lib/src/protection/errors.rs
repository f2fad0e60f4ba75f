//! Error types for node protection.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised while encrypting or decrypting a node.
///
/// Decryption failures never reveal whether the key, the wrapped key or the
/// ciphertext was at fault.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProtectionError {
    /// Encrypt on a protected node, or decrypt on a plain one
    #[error("Cannot {operation} node {node} while it is {state}")]
    InvalidStateTransition {
        node: NodeId,
        operation: &'static str,
        state: &'static str,
    },

    /// Wrong key, corrupted payload or unknown algorithm
    #[error("Cryptographic failure: {reason}")]
    CryptographicFailure { reason: String },

    /// Key material of the wrong length or a degenerate public key
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    /// The node cannot be the target of protection
    #[error("Node {node} cannot be protected: {reason}")]
    NotProtectable { node: NodeId, reason: String },
}

impl ProtectionError {
    /// Check if this error is an illegal state change
    pub fn is_invalid_state_transition(&self) -> bool {
        matches!(self, ProtectionError::InvalidStateTransition { .. })
    }

    /// Check if this error is a cryptographic or payload failure
    pub fn is_cryptographic_failure(&self) -> bool {
        matches!(self, ProtectionError::CryptographicFailure { .. })
    }

    /// Check if this error was caused by a bad key or target
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            ProtectionError::InvalidKey { .. } | ProtectionError::NotProtectable { .. }
        )
    }
}

impl From<ProtectionError> for crate::Error {
    fn from(err: ProtectionError) -> Self {
        crate::Error::Protection(err)
    }
}
