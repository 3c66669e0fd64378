//! Error types for the Murmur wire format.
//!
//! Every variant describes a datagram that cannot be turned into an
//! [`Envelope`](crate::Envelope) or [`Message`](crate::Message). Receivers
//! treat all of them as a malformed envelope: log, drop, continue.

use thiserror::Error;

/// Errors that can occur while encoding or decoding envelopes and messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // Envelope framing errors
    /// Datagram is shorter than the fixed header
    #[error("envelope too short: expected at least {expected} bytes, got {actual}")]
    EnvelopeTooShort {
        /// Expected minimum size in bytes
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Invalid magic number in envelope header
    #[error("invalid magic number: expected 0x4D524D52 (\"MRMR\")")]
    InvalidMagic,

    /// Unsupported protocol version
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Scheme tag does not name a known confidentiality scheme
    #[error("unknown confidentiality scheme tag: {0:#04x}")]
    UnknownScheme(u8),

    /// Reserved header bytes are not zero
    #[error("reserved header bytes must be zero")]
    ReservedBitsSet,

    /// Payload exceeds what one datagram can carry
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Header claims more payload than the datagram holds
    #[error("envelope truncated: header claims {expected} payload bytes, {actual} available")]
    EnvelopeTruncated {
        /// Payload size from header
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Datagram holds bytes past the end of the payload
    #[error("trailing bytes: header claims {expected} payload bytes, but {actual} present")]
    TrailingBytes {
        /// Payload size from header
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },

    // CBOR errors (wrapped for testability)
    /// Failed to encode data as CBOR
    #[error("failed to encode CBOR: {0}")]
    CborEncode(String),

    /// Failed to decode CBOR data
    #[error("failed to decode CBOR: {0}")]
    CborDecode(String),
}

/// Convenient Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
