//! Error types for confidentiality schemes.

use murmur_proto::SchemeKind;
use thiserror::Error;

use crate::passphrase::PassphraseRule;

/// Errors produced while sealing, opening, or loading key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Ciphertext did not open: wrong key, tampered bytes, or bad padding
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Ciphertext is shorter than the scheme's fixed overhead
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort {
        /// Minimum ciphertext size
        expected: usize,
        /// Actual ciphertext size
        actual: usize,
    },

    /// Plaintext exceeds what the scheme can seal into one envelope
    #[error("payload too large for {scheme} scheme: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Scheme that rejected the plaintext
        scheme: SchemeKind,
        /// Plaintext size
        size: usize,
        /// Largest plaintext the scheme accepts
        max: usize,
    },

    /// Key bytes or PEM text could not be parsed or are too weak
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Passphrase does not meet the acceptance policy
    #[error("weak passphrase: {0}")]
    WeakPassphrase(PassphraseRule),

    /// Per-recipient scheme was asked to seal without a recipient key
    #[error("no public key for recipient")]
    MissingRecipientKey,

    /// Underlying cipher refused to encrypt
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Key pair or key derivation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
}

impl CryptoError {
    /// Returns true if the ciphertext itself could not be opened.
    ///
    /// These are per-datagram failures: the receiver drops the datagram and
    /// keeps going.
    pub fn is_confidentiality_failure(&self) -> bool {
        matches!(self, Self::Decryption(_) | Self::CiphertextTooShort { .. })
    }

    /// Returns true if the error is about configured key material rather
    /// than a particular message.
    pub fn is_key_material(&self) -> bool {
        matches!(
            self,
            Self::InvalidKeyMaterial(_) | Self::WeakPassphrase(_) | Self::KeyGeneration(_)
        )
    }
}
