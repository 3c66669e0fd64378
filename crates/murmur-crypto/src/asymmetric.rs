//! Per-recipient scheme: RSA-OAEP with SHA-256.
//!
//! Each participant generates an RSA key pair at startup and hands its public
//! key to the others out of band as PEM. A message is sealed once per
//! recipient with that recipient's public key and opened with the local
//! private key.
//!
//! OAEP caps the plaintext at `k - 2 * hLen - 2` bytes, where `k` is the
//! modulus size in bytes and `hLen` is 32 for SHA-256. For a 2048-bit key
//! that is 190 bytes. Longer plaintexts are rejected with
//! [`CryptoError::PayloadTooLarge`] before anything is encrypted.

use std::fmt;

use murmur_proto::SchemeKind;
use rand::{CryptoRng, RngCore};
use rsa::{
    Oaep, RsaPrivateKey, RsaPublicKey,
    pkcs1::DecodeRsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding},
    traits::PublicKeyParts,
};
use sha2::Sha256;

use crate::CryptoError;

/// Modulus size used when a session generates its key pair
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus accepted for local or peer keys
pub const MIN_KEY_BITS: usize = 2048;

/// SHA-256 output size, the OAEP `hLen`
const OAEP_HASH_LEN: usize = 32;

/// A peer's RSA public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PeerPublicKey(RsaPublicKey);

impl PeerPublicKey {
    /// Parse a PEM public key.
    ///
    /// Accepts SubjectPublicKeyInfo (`BEGIN PUBLIC KEY`) and falls back to
    /// PKCS#1 (`BEGIN RSA PUBLIC KEY`).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyMaterial`] if neither encoding parses
    /// or the modulus is shorter than [`MIN_KEY_BITS`].
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        let key = RsaPublicKey::from_public_key_pem(pem.trim())
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem.trim()))
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("public key PEM: {e}")))?;

        let key = Self(key);
        if key.bits() < MIN_KEY_BITS {
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "public key is {} bits, minimum is {MIN_KEY_BITS}",
                key.bits()
            )));
        }

        Ok(key)
    }

    /// Encode as SubjectPublicKeyInfo PEM.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyMaterial`] if encoding fails.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("public key PEM: {e}")))
    }

    /// Modulus size in bits
    #[must_use]
    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }

    /// Largest plaintext this key can seal
    #[must_use]
    pub fn max_plaintext_len(&self) -> usize {
        self.0.size().saturating_sub(2 * OAEP_HASH_LEN + 2)
    }

    /// Seal `plaintext` to this key.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::PayloadTooLarge`] if `plaintext` exceeds
    ///   [`Self::max_plaintext_len`]
    /// - [`CryptoError::Encryption`] if RSA encryption fails
    pub fn seal<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let max = self.max_plaintext_len();
        if plaintext.len() > max {
            return Err(CryptoError::PayloadTooLarge {
                scheme: SchemeKind::AsymmetricPerPeer,
                size: plaintext.len(),
                max,
            });
        }

        self.0
            .encrypt(rng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }
}

impl fmt::Debug for PeerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PeerPublicKey").field(&self.bits()).finish()
    }
}

/// Parse a peer's PEM public key.
///
/// Shorthand for [`PeerPublicKey::from_pem`].
pub fn parse_public_key_pem(pem: &str) -> Result<PeerPublicKey, CryptoError> {
    PeerPublicKey::from_pem(pem)
}

/// Local key pair for the per-recipient scheme.
#[derive(Clone)]
pub struct AsymmetricPerPeer {
    private: RsaPrivateKey,
    public: PeerPublicKey,
}

impl AsymmetricPerPeer {
    /// Generate a fresh key pair.
    ///
    /// Never persisted; a new pair is generated for each session.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::InvalidKeyMaterial`] if `bits` is below
    ///   [`MIN_KEY_BITS`]
    /// - [`CryptoError::KeyGeneration`] if RSA key generation fails
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "key size {bits} bits is below minimum {MIN_KEY_BITS}"
            )));
        }

        let private =
            RsaPrivateKey::new(rng, bits).map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = PeerPublicKey(RsaPublicKey::from(&private));

        Ok(Self { private, public })
    }

    /// Our public key, for handing to peers
    #[must_use]
    pub fn public_key(&self) -> &PeerPublicKey {
        &self.public
    }

    /// Our public key as SubjectPublicKeyInfo PEM.
    pub fn public_key_pem(&self) -> Result<String, CryptoError> {
        self.public.to_pem()
    }

    /// Seal `plaintext` to `recipient`.
    ///
    /// See [`PeerPublicKey::seal`].
    pub fn seal<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
        recipient: &PeerPublicKey,
    ) -> Result<Vec<u8>, CryptoError> {
        recipient.seal(rng, plaintext)
    }

    /// Open a ciphertext sealed to our public key.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::CiphertextTooShort`] if shorter than the modulus
    /// - [`CryptoError::Decryption`] on wrong key or tampered ciphertext
    pub fn open(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let expected = self.private.size();
        if ciphertext.len() < expected {
            return Err(CryptoError::CiphertextTooShort { expected, actual: ciphertext.len() });
        }

        self.private
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|e| CryptoError::Decryption(e.to_string()))
    }
}

impl fmt::Debug for AsymmetricPerPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricPerPeer").field("public", &self.public).finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::OnceLock;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    /// Two key pairs shared by every test in the crate; generation is slow.
    pub(crate) fn key_pairs() -> &'static (AsymmetricPerPeer, AsymmetricPerPeer) {
        static PAIRS: OnceLock<(AsymmetricPerPeer, AsymmetricPerPeer)> = OnceLock::new();
        PAIRS.get_or_init(|| {
            let mut rng = ChaCha20Rng::seed_from_u64(0x4d52);
            let a = AsymmetricPerPeer::generate(&mut rng, DEFAULT_KEY_BITS).unwrap();
            let b = AsymmetricPerPeer::generate(&mut rng, DEFAULT_KEY_BITS).unwrap();
            (a, b)
        })
    }

    #[test]
    fn seal_open_round_trip() {
        let (alice, bob) = key_pairs();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let sealed = alice.seal(&mut rng, b"hello bob", bob.public_key()).unwrap();
        assert_eq!(sealed.len(), 256);
        assert_eq!(bob.open(&sealed).unwrap(), b"hello bob");
    }

    #[test]
    fn wrong_private_key_fails() {
        let (alice, bob) = key_pairs();
        let mut rng = ChaCha20Rng::seed_from_u64(2);

        let sealed = alice.seal(&mut rng, b"for bob only", bob.public_key()).unwrap();
        assert!(matches!(alice.open(&sealed), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn flipped_bit_fails() {
        let (alice, bob) = key_pairs();
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        let mut sealed = alice.seal(&mut rng, b"hello", bob.public_key()).unwrap();
        sealed[100] ^= 0x80;
        assert!(matches!(bob.open(&sealed), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let (_, bob) = key_pairs();
        let result = bob.open(&[0u8; 17]);
        assert_eq!(result, Err(CryptoError::CiphertextTooShort { expected: 256, actual: 17 }));
    }

    #[test]
    fn max_plaintext_for_2048_bit_key() {
        let (_, bob) = key_pairs();
        let mut rng = ChaCha20Rng::seed_from_u64(4);

        assert_eq!(bob.public_key().bits(), 2048);
        assert_eq!(bob.public_key().max_plaintext_len(), 190);

        let at_limit = vec![7u8; 190];
        let sealed = bob.public_key().seal(&mut rng, &at_limit).unwrap();
        assert_eq!(bob.open(&sealed).unwrap(), at_limit);
    }

    #[test]
    fn oversized_plaintext_rejected_before_encryption() {
        let (_, bob) = key_pairs();
        let mut rng = ChaCha20Rng::seed_from_u64(5);

        let result = bob.public_key().seal(&mut rng, &[0u8; 300]);
        assert_eq!(
            result,
            Err(CryptoError::PayloadTooLarge {
                scheme: SchemeKind::AsymmetricPerPeer,
                size: 300,
                max: 190
            })
        );
    }

    #[test]
    fn pem_round_trip() {
        let (alice, _) = key_pairs();

        let pem = alice.public_key_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));

        let parsed = parse_public_key_pem(&pem).unwrap();
        assert_eq!(&parsed, alice.public_key());
    }

    #[test]
    fn garbage_pem_is_invalid_key_material() {
        let pem = "-----BEGIN PUBLIC KEY-----\nnope\n-----END PUBLIC KEY-----";
        let result = PeerPublicKey::from_pem(pem);
        assert!(matches!(result, Err(CryptoError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn small_key_size_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let result = AsymmetricPerPeer::generate(&mut rng, 1024);
        assert!(matches!(result, Err(CryptoError::InvalidKeyMaterial(_))));
    }
}
