//! X25519 protection keys and their key-file form.

use std::fmt;

use base64ct::{Base64, Encoding};
use curve25519_dalek::montgomery::MontgomeryPoint;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Deserializer, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::ProtectionError;
use crate::Result;

/// Length of X25519 public and secret keys
pub const KEY_SIZE: usize = 32;

/// Current key file format version.
const KEY_FILE_VERSION: u8 = 0;

/// An X25519 key pair, or just the public half.
///
/// The public half is enough to encrypt; decryption needs the secret. The
/// secret is zeroized on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct ProtectionKey {
    public: [u8; KEY_SIZE],
    secret: Option<Zeroizing<[u8; KEY_SIZE]>>,
}

impl fmt::Debug for ProtectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectionKey")
            .field("public", &self.public_base64())
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PartialEq for ProtectionKey {
    /// Keys compare by their public half
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for ProtectionKey {}

impl ProtectionKey {
    /// Generates a fresh key pair from the OS random source
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.fill_bytes(&mut secret[..]);
        let public = MontgomeryPoint::mul_base_clamped(*secret).to_bytes();
        Self {
            public,
            secret: Some(secret),
        }
    }

    /// Builds a key pair from secret bytes; the public half is derived
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| ProtectionError::InvalidKey {
            reason: format!("secret key must be {KEY_SIZE} bytes, got {}", bytes.len()),
        })?;
        let secret = Zeroizing::new(secret);
        let public = MontgomeryPoint::mul_base_clamped(*secret).to_bytes();
        Ok(Self {
            public,
            secret: Some(secret),
        })
    }

    /// Builds an encrypt-only key from public bytes
    pub fn from_public_bytes(bytes: &[u8]) -> Result<Self> {
        let public: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| ProtectionError::InvalidKey {
            reason: format!("public key must be {KEY_SIZE} bytes, got {}", bytes.len()),
        })?;
        Ok(Self {
            public,
            secret: None,
        })
    }

    pub fn public_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.public
    }

    /// The public half as standard base64, as written in key files
    pub fn public_base64(&self) -> String {
        Base64::encode_string(&self.public)
    }

    pub(crate) fn secret_bytes(&self) -> Option<&[u8; KEY_SIZE]> {
        self.secret.as_deref()
    }

    /// Returns true if this key can decrypt
    pub fn has_private(&self) -> bool {
        self.secret.is_some()
    }

    /// A copy holding only the public half
    pub fn public_only(&self) -> Self {
        Self {
            public: self.public,
            secret: None,
        }
    }

    /// Serializes the key to its JSON key-file form
    pub fn to_json(&self) -> Result<String> {
        let file = KeyFile {
            version: KEY_FILE_VERSION,
            public: Base64::encode_string(&self.public),
            secret: self
                .secret
                .as_ref()
                .map(|secret| Base64::encode_string(&secret[..])),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Parses a JSON key file.
    ///
    /// When both halves are present the public key must match the secret.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: KeyFile = serde_json::from_str(json)?;
        let public = decode_key(&file.public, "public")?;
        match file.secret.as_deref() {
            Some(secret) => {
                let secret = Zeroizing::new(decode_key(secret, "secret")?);
                let key = Self::from_secret_bytes(&secret[..])?;
                if key.public != public {
                    return Err(ProtectionError::InvalidKey {
                        reason: "public key does not match secret key".to_string(),
                    }
                    .into());
                }
                Ok(key)
            }
            None => Self::from_public_bytes(&public),
        }
    }
}

fn decode_key(encoded: &str, which: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = Zeroizing::new(Base64::decode_vec(encoded).map_err(|_| {
        ProtectionError::InvalidKey {
            reason: format!("{which} key is not valid base64"),
        }
    })?);
    bytes.as_slice().try_into().map_err(|_| {
        ProtectionError::InvalidKey {
            reason: format!("{which} key must be {KEY_SIZE} bytes, got {}", bytes.len()),
        }
        .into()
    })
}

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_key_file_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != KEY_FILE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported key file version {version}; only version {KEY_FILE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk form of a [`ProtectionKey`]
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeyFile {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_key_file_version"
    )]
    version: u8,
    public: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
}
