//! Confidentiality schemes for Murmur envelopes.
//!
//! A scheme turns a serialized [`murmur_proto::Message`] into the opaque
//! payload of an envelope and back. Three schemes exist and are selected once
//! per session:
//!
//! - **Plaintext**: identity transform, no key material.
//! - **AsymmetricPerPeer**: RSA-OAEP (SHA-256 digest and MGF1) sealed to each
//!   recipient's public key, opened with the local private key. One
//!   ciphertext per peer.
//! - **SymmetricShared**: XChaCha20-Poly1305 under one group key, derived from
//!   a passphrase via HKDF-SHA256 or generated randomly. One ciphertext per
//!   send is enough, though the sender still seals per peer for uniformity.
//!
//! # Security
//!
//! Both encrypting schemes fail closed: a wrong key, a flipped bit, or a
//! truncated ciphertext is an error, never garbled plaintext. Oversized
//! plaintexts are rejected before any encryption is attempted.
//!
//! Randomness is always supplied by the caller so tests can run with a seeded
//! RNG.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod asymmetric;
pub mod error;
pub mod passphrase;
pub mod scheme;
pub mod symmetric;

pub use asymmetric::{
    AsymmetricPerPeer, DEFAULT_KEY_BITS, MIN_KEY_BITS, PeerPublicKey, parse_public_key_pem,
};
pub use error::CryptoError;
pub use passphrase::{MIN_PASSPHRASE_LEN, PassphraseRule, SYMBOLS, validate_passphrase};
pub use scheme::ConfidentialityScheme;
pub use symmetric::{SharedKey, SymmetricShared};
