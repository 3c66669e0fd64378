//! Envelope header with zero-copy parsing.
//!
//! The `EnvelopeHeader` is a fixed 20-byte structure serialized as raw binary
//! (Big Endian). Receivers learn the clock value and scheme without touching
//! the payload.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    SchemeKind,
    errors::{ProtocolError, Result},
};

/// Fixed 20-byte envelope header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays to avoid alignment issues with
/// `#[repr(C, packed)]`.
///
/// ```text
/// 0..4   magic         "MRMR"
/// 4      version       0x01
/// 5      scheme        SchemeKind tag
/// 6..8   reserved      zero
/// 8..12  payload_size  u32
/// 12..20 clock         u64 Lamport timestamp
/// ```
///
/// # Security
///
/// All 20-byte patterns are valid for the struct itself, so casting untrusted
/// bytes cannot cause undefined behavior. Semantic checks (magic, version,
/// reserved bytes, size limit) happen in [`EnvelopeHeader::from_bytes`]. The
/// scheme tag is checked by [`crate::Envelope::decode`].
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct EnvelopeHeader {
    magic: [u8; 4],
    version: u8,
    scheme: u8,
    reserved: [u8; 2],
    payload_size: [u8; 4],
    clock: [u8; 8],
}

impl EnvelopeHeader {
    /// Size of the serialized header
    pub const SIZE: usize = 20;

    /// Magic number: "MRMR" in ASCII (0x4D524D52)
    pub const MAGIC: u32 = 0x4D52_4D52;

    /// Current protocol version
    pub const VERSION: u8 = 0x01;

    /// Largest UDP payload over IPv4
    pub const MAX_DATAGRAM_SIZE: usize = 65_507;

    /// Maximum payload size: whatever is left of one datagram after the header
    pub const MAX_PAYLOAD_SIZE: u32 = (Self::MAX_DATAGRAM_SIZE - Self::SIZE) as u32;

    /// Create a header for a payload of `payload_size` bytes.
    #[must_use]
    pub fn new(scheme: SchemeKind, clock: u64, payload_size: u32) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            scheme: scheme.to_u8(),
            reserved: [0; 2],
            payload_size: payload_size.to_be_bytes(),
            clock: clock.to_be_bytes(),
        }
    }

    /// Parse header from network bytes (zero-copy, safe)
    ///
    /// Only the first [`Self::SIZE`] bytes are inspected; the rest of the
    /// slice is ignored here.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if:
    /// - Buffer is too short (< 20 bytes)
    /// - Magic number is invalid
    /// - Protocol version is unsupported
    /// - Reserved bytes are non-zero
    /// - Payload size exceeds maximum
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::EnvelopeTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0;

        if u32::from_be_bytes(header.magic) != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        if header.reserved != [0; 2] {
            return Err(ProtocolError::ReservedBitsSet);
        }

        let payload_size = u32::from_be_bytes(header.payload_size);
        if payload_size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_size as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize header to bytes (zero-copy)
    #[must_use]
    #[allow(clippy::wrong_self_convention)]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Get the magic number
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_be_bytes(self.magic)
    }

    /// Get the protocol version
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Get the raw scheme tag
    #[must_use]
    pub fn scheme_tag(&self) -> u8 {
        self.scheme
    }

    /// Get the scheme as an enum (if known)
    #[must_use]
    pub fn scheme(&self) -> Option<SchemeKind> {
        SchemeKind::from_u8(self.scheme)
    }

    /// Get the payload size
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }

    /// Get the Lamport clock value
    #[must_use]
    pub fn clock(&self) -> u64 {
        u64::from_be_bytes(self.clock)
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for EnvelopeHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeHeader")
            .field("magic", &format!("{:#010x}", self.magic()))
            .field("version", &self.version())
            .field("scheme", &format!("{:#04x}", self.scheme_tag()))
            .field("payload_size", &self.payload_size())
            .field("clock", &self.clock())
            .finish_non_exhaustive()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for EnvelopeHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for EnvelopeHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn valid_header_bytes() -> [u8; EnvelopeHeader::SIZE] {
        EnvelopeHeader::new(SchemeKind::Plaintext, 0, 0).to_bytes()
    }

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<EnvelopeHeader>(), EnvelopeHeader::SIZE);
        assert_eq!(EnvelopeHeader::SIZE, 20);
    }

    proptest! {
        #[test]
        fn header_round_trip(
            tag in 0u8..3,
            clock in any::<u64>(),
            size in 0u32..=EnvelopeHeader::MAX_PAYLOAD_SIZE,
        ) {
            let scheme = SchemeKind::from_u8(tag).unwrap_or(SchemeKind::Plaintext);
            let header = EnvelopeHeader::new(scheme, clock, size);
            let bytes = header.to_bytes();
            let parsed = EnvelopeHeader::from_bytes(&bytes).expect("should parse");

            prop_assert_eq!(&header, parsed);
            prop_assert_eq!(parsed.clock(), clock);
            prop_assert_eq!(parsed.payload_size(), size);
            prop_assert_eq!(parsed.scheme(), Some(scheme));
        }
    }

    #[test]
    fn reject_short_buffer() {
        let short_buf = [0u8; 12];
        let result = EnvelopeHeader::from_bytes(&short_buf);
        assert_eq!(result, Err(ProtocolError::EnvelopeTooShort { expected: 20, actual: 12 }));
    }

    #[test]
    fn reject_invalid_magic() {
        let mut buf = valid_header_bytes();
        buf[0..4].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);

        assert_eq!(EnvelopeHeader::from_bytes(&buf), Err(ProtocolError::InvalidMagic));
    }

    #[test]
    fn reject_invalid_version() {
        let mut buf = valid_header_bytes();
        buf[4] = 0xFF;

        assert_eq!(EnvelopeHeader::from_bytes(&buf), Err(ProtocolError::UnsupportedVersion(0xFF)));
    }

    #[test]
    fn reject_reserved_bytes() {
        let mut buf = valid_header_bytes();
        buf[7] = 0x01;

        assert_eq!(EnvelopeHeader::from_bytes(&buf), Err(ProtocolError::ReservedBitsSet));
    }

    #[test]
    fn reject_oversized_payload() {
        let mut buf = valid_header_bytes();
        let oversized = EnvelopeHeader::MAX_PAYLOAD_SIZE + 1;
        buf[8..12].copy_from_slice(&oversized.to_be_bytes());

        let result = EnvelopeHeader::from_bytes(&buf);
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    }

    #[test]
    fn unknown_scheme_is_visible_but_not_rejected_here() {
        let mut buf = valid_header_bytes();
        buf[5] = 0x7F;

        let header = EnvelopeHeader::from_bytes(&buf).expect("framing is valid");
        assert_eq!(header.scheme_tag(), 0x7F);
        assert_eq!(header.scheme(), None);
    }
}
