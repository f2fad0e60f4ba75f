//! Reversible encryption of section content.
//!
//! Protecting a node replaces all of its children with a single payload
//! element and marks the node `protected="true"`. The node itself, its
//! attributes and the comment attached to it stay in place, so handles and
//! declarations are unaffected. Unprotecting parses the decrypted children
//! back in, with the namespace bindings in scope at the node.
//!
//! Payload layout:
//!
//! ```xml
//! <EncryptedData version="1" algorithm="aes-256-gcm" keyAlgorithm="x25519-hkdf-sha256-aes-256-gcm">
//!   <EncryptedKey ephemeralKey="BASE64">BASE64</EncryptedKey>
//!   <CipherValue>BASE64</CipherValue>
//! </EncryptedData>
//! ```

use base64ct::{Base64, Encoding};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::{
    ConfigDocument, ConfigNode, Result,
    constants::{
        ATTR_PROTECTED, NATIVE_DICTIONARY, PAYLOAD_ALGORITHM, PAYLOAD_ATTR_ALGORITHM,
        PAYLOAD_ATTR_EPHEMERAL_KEY, PAYLOAD_ATTR_KEY_ALGORITHM, PAYLOAD_ATTR_VERSION,
        PAYLOAD_CIPHER_ELEMENT, PAYLOAD_ELEMENT, PAYLOAD_KEY_ALGORITHM, PAYLOAD_KEY_ELEMENT,
        PAYLOAD_VERSION,
    },
    dom::{self, Dom, NodeId},
};

mod crypto;
mod errors;
mod keys;

pub use crypto::{NONCE_LENGTH, Sealed, open, seal};
pub use errors::ProtectionError;
pub use keys::{KEY_SIZE, ProtectionKey};

/// Whether a node's children are readable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtectionState {
    Plain,
    Protected,
}

impl ProtectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionState::Plain => "plain",
            ProtectionState::Protected => "protected",
        }
    }
}

fn payload_error(reason: impl Into<String>) -> crate::Error {
    ProtectionError::CryptographicFailure {
        reason: reason.into(),
    }
    .into()
}

/// Builds a detached payload element for `sealed`
fn write_payload(dom: &mut Dom, sealed: &Sealed) -> Result<NodeId> {
    let payload = dom.create_element(PAYLOAD_ELEMENT);
    dom.set_attribute(payload, PAYLOAD_ATTR_VERSION, PAYLOAD_VERSION)?;
    dom.set_attribute(payload, PAYLOAD_ATTR_ALGORITHM, PAYLOAD_ALGORITHM)?;
    dom.set_attribute(payload, PAYLOAD_ATTR_KEY_ALGORITHM, PAYLOAD_KEY_ALGORITHM)?;

    let key = dom.create_element(PAYLOAD_KEY_ELEMENT);
    dom.set_attribute(
        key,
        PAYLOAD_ATTR_EPHEMERAL_KEY,
        Base64::encode_string(&sealed.ephemeral_public),
    )?;
    let wrapped = dom.create_text(Base64::encode_string(&sealed.wrapped_key));
    dom.append_child(key, wrapped)?;
    dom.append_child(payload, key)?;

    let cipher = dom.create_element(PAYLOAD_CIPHER_ELEMENT);
    let ciphertext = dom.create_text(Base64::encode_string(&sealed.ciphertext));
    dom.append_child(cipher, ciphertext)?;
    dom.append_child(payload, cipher)?;
    Ok(payload)
}

/// Reads the payload element under a protected `node`.
///
/// Anything other than exactly one well-formed version 1 payload is a
/// cryptographic failure.
fn read_payload(dom: &Dom, node: NodeId) -> Result<Sealed> {
    let elements = dom.child_elements(node)?;
    let [payload] = elements.as_slice() else {
        return Err(payload_error("expected exactly one payload element"));
    };
    let payload = *payload;
    if dom.name(payload)? != PAYLOAD_ELEMENT {
        return Err(payload_error("unexpected payload element"));
    }

    let expect = |attr: &str, expected: &str| -> Result<()> {
        match dom.attribute(payload, attr)? {
            Some(value) if value == expected => Ok(()),
            Some(value) => Err(payload_error(format!("unsupported {attr} '{value}'"))),
            None => Err(payload_error(format!("payload has no {attr}"))),
        }
    };
    expect(PAYLOAD_ATTR_VERSION, PAYLOAD_VERSION)?;
    expect(PAYLOAD_ATTR_ALGORITHM, PAYLOAD_ALGORITHM)?;
    expect(PAYLOAD_ATTR_KEY_ALGORITHM, PAYLOAD_KEY_ALGORITHM)?;

    let key = dom
        .find_child(payload, PAYLOAD_KEY_ELEMENT)?
        .ok_or_else(|| payload_error("payload has no wrapped key"))?;
    let cipher = dom
        .find_child(payload, PAYLOAD_CIPHER_ELEMENT)?
        .ok_or_else(|| payload_error("payload has no ciphertext"))?;
    let ephemeral = dom
        .attribute(key, PAYLOAD_ATTR_EPHEMERAL_KEY)?
        .ok_or_else(|| payload_error("payload has no ephemeral key"))?;

    let decode = |text: &str| -> Result<Vec<u8>> {
        Base64::decode_vec(text.trim()).map_err(|_| payload_error("payload is not valid base64"))
    };
    let ephemeral_public: [u8; KEY_SIZE] = decode(ephemeral)?
        .as_slice()
        .try_into()
        .map_err(|_| payload_error("ephemeral key has the wrong length"))?;

    Ok(Sealed {
        ephemeral_public,
        wrapped_key: decode(&dom.text(key)?)?,
        ciphertext: decode(&dom.text(cipher)?)?,
    })
}

/// Fails unless `plaintext` parses back to nodes that render as `plaintext`
fn check_reparses(node: NodeId, plaintext: &str, bindings: &[(String, String)]) -> Result<()> {
    let not_protectable = |reason: String| -> crate::Error {
        ProtectionError::NotProtectable { node, reason }.into()
    };
    let mut scratch = Dom::new();
    let holder = scratch.create_element(PAYLOAD_ELEMENT);
    let children = dom::parse::parse_fragment(&mut scratch, plaintext, bindings).map_err(|e| {
        not_protectable(format!("content does not serialize to well-formed XML: {e}"))
    })?;
    for child in children {
        scratch.append_child(holder, child)?;
    }
    if *Zeroizing::new(dom::render::render_children(&scratch, holder)?) != plaintext {
        return Err(not_protectable(
            "content does not survive serialization unchanged".to_string(),
        ));
    }
    Ok(())
}

impl ConfigDocument {
    /// Current protection state of a node
    pub fn protection_state(&self, node: impl Into<NodeId>) -> Result<ProtectionState> {
        Ok(if self.is_protected(node)? {
            ProtectionState::Protected
        } else {
            ProtectionState::Plain
        })
    }

    /// Checks that `node` is a property section, a native dictionary section,
    /// or a `<dictionary>` element inside a native section
    fn check_protectable(&self, node: NodeId) -> Result<()> {
        let not_protectable = |reason: String| -> crate::Error {
            ProtectionError::NotProtectable { node, reason }.into()
        };

        if let Ok(ConfigNode::Section(section)) = self.classify(node) {
            let kind = self.section_kind(section)?;
            if kind.is_protectable() {
                return Ok(());
            }
            return Err(not_protectable(format!("{} sections cannot be protected", kind.name())));
        }

        if self.dom().name(node)? != NATIVE_DICTIONARY {
            return Err(not_protectable(
                "only sections and native dictionaries can be protected".to_string(),
            ));
        }
        let mut current = self.dom().parent(node)?;
        while let Some(ancestor) = current {
            if let Ok(ConfigNode::Section(section)) = self.classify(ancestor) {
                if self.section_kind(section)?.is_native() {
                    return Ok(());
                }
                break;
            }
            current = self.dom().parent(ancestor)?;
        }
        Err(not_protectable("dictionary is not part of a native section".to_string()))
    }

    /// Encrypts the children of `target` for `key`.
    ///
    /// Only the public half of `key` is used. The children are rendered in
    /// canonical form, checked to parse back unchanged, sealed under a fresh
    /// data key, and replaced by a single payload element.
    ///
    /// # Errors
    /// - `ProtectionError::NotProtectable` for unsupported targets, or content
    ///   that would not decrypt back to the same nodes
    /// - `ProtectionError::InvalidStateTransition` if `target` is already protected
    /// - `ProtectionError::InvalidKey` for a degenerate public key
    pub fn encrypt(&mut self, target: impl Into<NodeId>, key: &ProtectionKey) -> Result<()> {
        let node = target.into();
        self.check_protectable(node)?;
        if self.is_protected(node)? {
            return Err(ProtectionError::InvalidStateTransition {
                node,
                operation: "encrypt",
                state: ProtectionState::Protected.as_str(),
            }
            .into());
        }

        let plaintext = Zeroizing::new(dom::render::render_children(self.dom(), node)?);
        let bindings = dom::namespace_bindings(self.dom(), node)?;
        check_reparses(node, &plaintext, &bindings)?;
        let sealed = seal(plaintext.as_bytes(), key)?;

        let dom = self.dom_mut();
        let payload = write_payload(dom, &sealed)?;
        dom.clear_children(node)?;
        dom.append_child(node, payload)?;
        dom.set_attribute(node, ATTR_PROTECTED, "true")?;

        info!(node = %node, bytes = plaintext.len(), "protected node");
        self.commit()
    }

    /// Decrypts the payload of `target` and restores its children.
    ///
    /// # Errors
    /// - `ProtectionError::NotProtectable` for unsupported targets
    /// - `ProtectionError::InvalidStateTransition` if `target` is not protected
    /// - `ProtectionError::CryptographicFailure` if `key` has no private half,
    ///   is the wrong key, or the payload is malformed or tampered with
    pub fn decrypt(&mut self, target: impl Into<NodeId>, key: &ProtectionKey) -> Result<()> {
        let node = target.into();
        self.check_protectable(node)?;
        if !self.is_protected(node)? {
            return Err(ProtectionError::InvalidStateTransition {
                node,
                operation: "decrypt",
                state: ProtectionState::Plain.as_str(),
            }
            .into());
        }
        if !key.has_private() {
            return Err(payload_error("key has no private component"));
        }

        let sealed = read_payload(self.dom(), node)?;
        let plaintext = open(&sealed, key).inspect_err(|_| {
            warn!(node = %node, "failed to open protected payload");
        })?;
        let plaintext = std::str::from_utf8(&plaintext)
            .map_err(|_| payload_error("decrypted payload is not UTF-8"))?;

        let bindings = dom::namespace_bindings(self.dom(), node)?;
        let dom = self.dom_mut();
        let children = dom::parse::parse_fragment(dom, plaintext, &bindings)
            .map_err(|_| payload_error("decrypted payload is not well-formed XML"))?;
        dom.clear_children(node)?;
        for child in children {
            dom.append_child(node, child)?;
        }
        dom.remove_attribute(node, ATTR_PROTECTED)?;

        info!(node = %node, bytes = plaintext.len(), "unprotected node");
        self.commit()
    }
}
