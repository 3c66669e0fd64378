//! Shared-key scheme: XChaCha20-Poly1305 under one group key.
//!
//! The key is either derived from an operator passphrase (HKDF-SHA256 with a
//! fixed salt, so every participant typing the same passphrase gets the same
//! key) or generated randomly and shared out of band as hex.
//!
//! Wire format of a sealed payload: `nonce (24 bytes) || ciphertext || tag (16
//! bytes)`. Nonces are random per seal; the 192-bit space makes collisions
//! negligible.

use std::fmt;

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use murmur_proto::{EnvelopeHeader, SchemeKind};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::{CryptoError, passphrase::validate_passphrase};

/// Key size in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// XChaCha20 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Fixed per-seal overhead
pub const OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

const HKDF_SALT: &[u8] = b"murmur-v1-passphrase";
const HKDF_INFO: &[u8] = b"murmur-v1-shared-key";

/// A 256-bit group key.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedKey([u8; KEY_SIZE]);

impl SharedKey {
    /// Derive the group key from a passphrase, enforcing the passphrase
    /// policy first.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::WeakPassphrase`] if the policy rejects it.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CryptoError> {
        validate_passphrase(passphrase)?;
        Self::derive(passphrase)
    }

    /// Derive without the policy check.
    ///
    /// Deterministic: the same passphrase always yields the same key.
    pub fn derive(passphrase: &str) -> Result<Self, CryptoError> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), passphrase.as_bytes());
        let mut key = [0u8; KEY_SIZE];
        hk.expand(HKDF_INFO, &mut key).map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self(key))
    }

    /// Generate a random group key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut key = [0u8; KEY_SIZE];
        rng.fill_bytes(&mut key);
        Self(key)
    }

    /// Parse a key shared as 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyMaterial`] for bad hex or wrong length.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(text.trim())
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("shared key: {e}")))?;

        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            CryptoError::InvalidKeyMaterial(format!(
                "shared key: expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;

        Ok(Self(key))
    }

    /// Hex encoding for out-of-band sharing
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw key bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(..)")
    }
}

/// Shared-key confidentiality scheme.
pub struct SymmetricShared {
    cipher: XChaCha20Poly1305,
}

impl SymmetricShared {
    /// Largest plaintext that still fits in one envelope
    pub const MAX_PLAINTEXT_LEN: usize = EnvelopeHeader::MAX_PAYLOAD_SIZE as usize - OVERHEAD;

    /// Create the scheme from a group key
    #[must_use]
    pub fn new(key: &SharedKey) -> Self {
        Self { cipher: XChaCha20Poly1305::new(key.as_bytes().into()) }
    }

    /// Seal `plaintext` under the group key with a fresh random nonce.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::PayloadTooLarge`] if the result would not fit in one
    ///   envelope
    /// - [`CryptoError::Encryption`] if the cipher refuses
    pub fn seal<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if plaintext.len() > Self::MAX_PLAINTEXT_LEN {
            return Err(CryptoError::PayloadTooLarge {
                scheme: SchemeKind::SymmetricShared,
                size: plaintext.len(),
                max: Self::MAX_PLAINTEXT_LEN,
            });
        }

        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a sealed payload.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::CiphertextTooShort`] if shorter than nonce + tag
    /// - [`CryptoError::Decryption`] on tag mismatch (wrong key or tampering)
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < OVERHEAD {
            return Err(CryptoError::CiphertextTooShort {
                expected: OVERHEAD,
                actual: sealed.len(),
            });
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

        self.cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))
    }
}

impl fmt::Debug for SymmetricShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricShared").finish_non_exhaustive()
    }
}
