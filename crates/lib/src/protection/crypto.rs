//! Hybrid encryption of payload bytes.
//!
//! Each payload gets a fresh 32-byte data key. The data key encrypts the
//! plaintext with AES-256-GCM; the data key is wrapped with AES-256-GCM under
//! a key-encryption key derived by HKDF-SHA256 from an ephemeral X25519
//! exchange with the recipient's public key.
//!
//! Wire format of both ciphertexts: nonce (12 bytes) || ciphertext.

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng},
};
use curve25519_dalek::montgomery::MontgomeryPoint;
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_SIZE, ProtectionError, ProtectionKey};
use crate::Result;

/// Nonce length for AES-GCM (12 bytes standard)
pub const NONCE_LENGTH: usize = 12;

/// HKDF salt separating this scheme from other uses of the same keys
const KEY_WRAP_DOMAIN: &[u8] = b"cfgdoc/protection/key-wrap/v1";

/// Encrypted payload parts before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Ephemeral X25519 public key
    pub ephemeral_public: [u8; KEY_SIZE],
    /// nonce || wrapped data key
    pub wrapped_key: Vec<u8>,
    /// nonce || ciphertext
    pub ciphertext: Vec<u8>,
}

fn failure(reason: impl Into<String>) -> crate::Error {
    ProtectionError::CryptographicFailure {
        reason: reason.into(),
    }
    .into()
}

/// Derives the key-encryption key from an X25519 shared secret
fn derive_kek(
    shared_secret: &[u8; KEY_SIZE],
    ephemeral_public: &[u8; KEY_SIZE],
    recipient_public: &[u8; KEY_SIZE],
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut info = Vec::with_capacity(2 * KEY_SIZE);
    info.extend_from_slice(ephemeral_public);
    info.extend_from_slice(recipient_public);

    let hkdf = Hkdf::<Sha256>::new(Some(KEY_WRAP_DOMAIN), shared_secret);
    let mut output = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(&info, &mut output[..])
        .map_err(|_| failure("key derivation failed"))?;
    Ok(output)
}

fn aes_encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| failure(format!("failed to create cipher: {e}")))?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| failure(format!("encryption failed: {e}")))?;

    let mut result = nonce.to_vec();
    result.extend(ciphertext);
    Ok(result)
}

fn aes_decrypt(key: &[u8; KEY_SIZE], data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if data.len() < NONCE_LENGTH {
        return Err(failure(format!(
            "ciphertext too short: expected at least {NONCE_LENGTH} bytes, got {}",
            data.len()
        )));
    }
    let (nonce_bytes, encrypted) = data.split_at(NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| failure(format!("failed to create cipher: {e}")))?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
        .map(Zeroizing::new)
        .map_err(|_| failure("decryption failed"))
}

/// Encrypts `plaintext` so only the holder of `recipient`'s secret can read it
pub fn seal(plaintext: &[u8], recipient: &ProtectionKey) -> Result<Sealed> {
    let mut ephemeral_secret = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(&mut ephemeral_secret[..]);
    let ephemeral_public = MontgomeryPoint::mul_base_clamped(*ephemeral_secret).to_bytes();

    let recipient_public = recipient.public_bytes();
    let shared = Zeroizing::new(MontgomeryPoint(*recipient_public).mul_clamped(*ephemeral_secret).to_bytes());
    if shared.iter().all(|b| *b == 0) {
        return Err(ProtectionError::InvalidKey {
            reason: "public key is a low-order point".to_string(),
        }
        .into());
    }
    let kek = derive_kek(&shared, &ephemeral_public, recipient_public)?;

    let mut data_key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(&mut data_key[..]);

    Ok(Sealed {
        ephemeral_public,
        wrapped_key: aes_encrypt(&kek, &data_key[..])?,
        ciphertext: aes_encrypt(&data_key, plaintext)?,
    })
}

/// Decrypts a sealed payload with the secret half of `key`
pub fn open(sealed: &Sealed, key: &ProtectionKey) -> Result<Zeroizing<Vec<u8>>> {
    let secret = key
        .secret_bytes()
        .ok_or_else(|| failure("key has no private component"))?;

    let shared = Zeroizing::new(MontgomeryPoint(sealed.ephemeral_public).mul_clamped(*secret).to_bytes());
    if shared.iter().all(|b| *b == 0) {
        return Err(failure("ephemeral key is a low-order point"));
    }
    let kek = derive_kek(&shared, &sealed.ephemeral_public, key.public_bytes())?;

    let data_key = aes_decrypt(&kek, &sealed.wrapped_key)?;
    let data_key: Zeroizing<[u8; KEY_SIZE]> = Zeroizing::new(
        data_key
            .as_slice()
            .try_into()
            .map_err(|_| failure("wrapped key has the wrong length"))?,
    );
    aes_decrypt(&data_key, &sealed.ciphertext)
}
