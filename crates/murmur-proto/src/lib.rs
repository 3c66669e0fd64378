//! Wire format for the Murmur group chat protocol.
//!
//! Every datagram carries exactly one [`Envelope`]: a fixed 20-byte header
//! (zero-copy binary, Big Endian) followed by the payload bytes. The header
//! holds the sender's Lamport clock value and the confidentiality scheme the
//! payload was sealed under. The payload is opaque at this layer; once opened
//! it decodes to a CBOR [`Message`].
//!
//! Keeping the clock outside the sealed payload means every peer of one
//! logical send sees the same clock value even though ciphertext differs per
//! recipient.
//!
//! # Security
//!
//! All parsing uses compile-time verified layouts via `zerocopy`. Payloads are
//! limited to what fits in a single UDP datagram, and decoding rejects
//! truncated input and trailing bytes.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod header;
pub mod message;
pub mod scheme;

pub use envelope::Envelope;
pub use errors::{ProtocolError, Result};
pub use header::EnvelopeHeader;
pub use message::Message;
pub use scheme::SchemeKind;
