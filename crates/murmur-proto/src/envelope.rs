//! Envelope: one datagram on the wire.
//!
//! Layout: `[EnvelopeHeader: 20 bytes, raw binary] + [payload: variable]`.
//! The payload is whatever the active confidentiality scheme produced.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    EnvelopeHeader, SchemeKind,
    errors::{ProtocolError, Result},
};

/// Wire record pairing a Lamport clock value with a sealed payload.
///
/// # Invariants
///
/// - **Shared clock**: every envelope produced for one logical send carries
///   the same `clock`, even though `payload` differs per recipient under the
///   asymmetric scheme.
/// - **Size limit**: `payload.len()` MUST NOT exceed
///   [`EnvelopeHeader::MAX_PAYLOAD_SIZE`]. Enforced by [`Envelope::encode`]
///   and [`Envelope::decode`].
///
/// This type guarantees structural validity only. It says nothing about
/// whether the payload opens under the receiver's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Scheme the payload was sealed under
    pub scheme: SchemeKind,

    /// Sender's Lamport clock at the moment of the send
    pub clock: u64,

    /// Sealed payload bytes
    pub payload: Bytes,
}

impl Envelope {
    /// Create a new envelope
    #[must_use]
    pub fn new(scheme: SchemeKind, clock: u64, payload: impl Into<Bytes>) -> Self {
        Self { scheme, clock, payload: payload.into() }
    }

    /// Total size on the wire
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        EnvelopeHeader::SIZE + self.payload.len()
    }

    /// Build the header describing this envelope
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if the payload does not fit
    /// in one datagram.
    pub fn header(&self) -> Result<EnvelopeHeader> {
        let max = EnvelopeHeader::MAX_PAYLOAD_SIZE as usize;
        if self.payload.len() > max {
            return Err(ProtocolError::PayloadTooLarge { size: self.payload.len(), max });
        }

        Ok(EnvelopeHeader::new(self.scheme, self.clock, self.payload.len() as u32))
    }

    /// Encode envelope into buffer
    ///
    /// Writes: `[header (20 bytes)] + [payload (variable)]`
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] if payload exceeds
    /// [`EnvelopeHeader::MAX_PAYLOAD_SIZE`]. Nothing is written in that case.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let header = self.header()?;

        dst.put_slice(&header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Encode into a freshly allocated buffer
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode envelope from one datagram
    ///
    /// The datagram must contain exactly one envelope: a valid header, then
    /// exactly `payload_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Header parsing fails (short input, magic, version, reserved, size)
    /// - The scheme tag is unknown
    /// - Payload is truncated
    /// - Bytes follow the payload
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = EnvelopeHeader::from_bytes(bytes)?;

        let scheme = header
            .scheme()
            .ok_or_else(|| ProtocolError::UnknownScheme(header.scheme_tag()))?;

        let payload_size = header.payload_size() as usize;
        let available = bytes.len() - EnvelopeHeader::SIZE;

        if available < payload_size {
            return Err(ProtocolError::EnvelopeTruncated {
                expected: payload_size,
                actual: available,
            });
        }

        if available > payload_size {
            return Err(ProtocolError::TrailingBytes { expected: payload_size, actual: available });
        }

        let payload = Bytes::copy_from_slice(&bytes[EnvelopeHeader::SIZE..]);

        Ok(Self { scheme, clock: header.clock(), payload })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for Envelope {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            (
                prop::sample::select(SchemeKind::ALL.to_vec()),
                any::<u64>(),
                prop::collection::vec(any::<u8>(), 0..512),
            )
                .prop_map(|(scheme, clock, payload)| Envelope::new(scheme, clock, payload))
                .boxed()
        }
    }

    proptest! {
        #[test]
        fn envelope_round_trip(envelope in any::<Envelope>()) {
            let wire = envelope.to_bytes().expect("should encode");
            prop_assert_eq!(wire.len(), envelope.encoded_len());

            let parsed = Envelope::decode(&wire).expect("should decode");
            prop_assert_eq!(envelope, parsed);
        }

        #[test]
        fn truncation_never_decodes(envelope in any::<Envelope>(), cut in 1usize..64) {
            let wire = envelope.to_bytes().expect("should encode");
            let cut = cut.min(wire.len());

            prop_assert!(Envelope::decode(&wire[..wire.len() - cut]).is_err());
        }
    }

    #[test]
    fn empty_payload_and_zero_clock() {
        let envelope = Envelope::new(SchemeKind::Plaintext, 0, Bytes::new());
        let wire = envelope.to_bytes().unwrap();
        assert_eq!(wire.len(), EnvelopeHeader::SIZE);

        assert_eq!(Envelope::decode(&wire).unwrap(), envelope);
    }

    #[test]
    fn wire_layout_snapshot() {
        let envelope = Envelope::new(SchemeKind::SymmetricShared, 42, &b"hi"[..]);
        let wire = hex::encode(envelope.to_bytes().unwrap());

        insta::assert_snapshot!(wire, @"4d524d520102000000000002000000000000002a6869");
    }

    #[test]
    fn reject_truncated_payload() {
        let envelope = Envelope::new(SchemeKind::Plaintext, 7, vec![1, 2, 3, 4]);
        let wire = envelope.to_bytes().unwrap();

        let result = Envelope::decode(&wire[..wire.len() - 1]);
        assert_eq!(result, Err(ProtocolError::EnvelopeTruncated { expected: 4, actual: 3 }));
    }

    #[test]
    fn reject_trailing_bytes() {
        let envelope = Envelope::new(SchemeKind::Plaintext, 7, vec![1, 2]);
        let mut wire = envelope.to_bytes().unwrap().to_vec();
        wire.push(0xAA);

        let result = Envelope::decode(&wire);
        assert_eq!(result, Err(ProtocolError::TrailingBytes { expected: 2, actual: 3 }));
    }

    #[test]
    fn reject_unknown_scheme() {
        let envelope = Envelope::new(SchemeKind::Plaintext, 1, vec![9]);
        let mut wire = envelope.to_bytes().unwrap().to_vec();
        wire[5] = 0x09;

        assert_eq!(Envelope::decode(&wire), Err(ProtocolError::UnknownScheme(0x09)));
    }

    #[test]
    fn reject_garbage() {
        assert!(Envelope::decode(b"definitely not an envelope").is_err());
        assert!(Envelope::decode(&[]).is_err());
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let size = EnvelopeHeader::MAX_PAYLOAD_SIZE as usize + 1;
        let envelope = Envelope::new(SchemeKind::Plaintext, 1, vec![0u8; size]);

        let mut buf = Vec::new();
        let result = envelope.encode(&mut buf);

        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
        assert!(buf.is_empty());
    }
}
