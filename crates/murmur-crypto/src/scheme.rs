//! The session-wide confidentiality scheme.

use murmur_proto::{EnvelopeHeader, SchemeKind};
use rand::{CryptoRng, RngCore};

use crate::{AsymmetricPerPeer, CryptoError, PeerPublicKey, SharedKey, SymmetricShared};

/// Confidentiality scheme selected once at session start.
///
/// Every participant in a session must use the same variant; the envelope
/// header carries the variant tag so a mismatch is detected before opening.
#[derive(Debug)]
pub enum ConfidentialityScheme {
    /// No confidentiality
    Plaintext,
    /// RSA-OAEP per recipient
    AsymmetricPerPeer(AsymmetricPerPeer),
    /// XChaCha20-Poly1305 under a group key
    SymmetricShared(SymmetricShared),
}

impl ConfidentialityScheme {
    /// Shared-key scheme from a passphrase, enforcing the passphrase policy.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CryptoError> {
        let key = SharedKey::from_passphrase(passphrase)?;
        Ok(Self::SymmetricShared(SymmetricShared::new(&key)))
    }

    /// Shared-key scheme from an existing group key
    #[must_use]
    pub fn from_shared_key(key: &SharedKey) -> Self {
        Self::SymmetricShared(SymmetricShared::new(key))
    }

    /// Wire tag for this scheme
    #[must_use]
    pub fn kind(&self) -> SchemeKind {
        match self {
            Self::Plaintext => SchemeKind::Plaintext,
            Self::AsymmetricPerPeer(_) => SchemeKind::AsymmetricPerPeer,
            Self::SymmetricShared(_) => SchemeKind::SymmetricShared,
        }
    }

    /// Largest plaintext sealable to `recipient` under this scheme.
    ///
    /// For the per-recipient scheme without a recipient key this is zero.
    #[must_use]
    pub fn max_plaintext_len(&self, recipient: Option<&PeerPublicKey>) -> usize {
        match self {
            Self::Plaintext => EnvelopeHeader::MAX_PAYLOAD_SIZE as usize,
            Self::AsymmetricPerPeer(_) => recipient.map_or(0, PeerPublicKey::max_plaintext_len),
            Self::SymmetricShared(_) => SymmetricShared::MAX_PLAINTEXT_LEN,
        }
    }

    /// Seal `plaintext` for one recipient.
    ///
    /// `recipient` is required by the per-recipient scheme and ignored by the
    /// others.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::PayloadTooLarge`] if `plaintext` cannot fit
    /// - [`CryptoError::MissingRecipientKey`] for the per-recipient scheme
    ///   without a key
    /// - [`CryptoError::Encryption`] if the cipher fails
    pub fn seal<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
        recipient: Option<&PeerPublicKey>,
    ) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Plaintext => {
                let max = EnvelopeHeader::MAX_PAYLOAD_SIZE as usize;
                if plaintext.len() > max {
                    return Err(CryptoError::PayloadTooLarge {
                        scheme: SchemeKind::Plaintext,
                        size: plaintext.len(),
                        max,
                    });
                }
                Ok(plaintext.to_vec())
            },
            Self::AsymmetricPerPeer(keys) => {
                let recipient = recipient.ok_or(CryptoError::MissingRecipientKey)?;
                keys.seal(rng, plaintext, recipient)
            },
            Self::SymmetricShared(cipher) => cipher.seal(rng, plaintext),
        }
    }

    /// Open a payload sealed to us.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Decryption`] or [`CryptoError::CiphertextTooShort`];
    /// both satisfy [`CryptoError::is_confidentiality_failure`].
    pub fn open(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Plaintext => Ok(ciphertext.to_vec()),
            Self::AsymmetricPerPeer(keys) => keys.open(ciphertext),
            Self::SymmetricShared(cipher) => cipher.open(ciphertext),
        }
    }

    /// Our public key, if this scheme has one
    #[must_use]
    pub fn public_key(&self) -> Option<&PeerPublicKey> {
        match self {
            Self::AsymmetricPerPeer(keys) => Some(keys.public_key()),
            Self::Plaintext | Self::SymmetricShared(_) => None,
        }
    }
}
