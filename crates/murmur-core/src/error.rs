//! Error types for the Murmur session core.
//!
//! Two families with different owners:
//! - [`SessionError`]: setup and send-side failures, surfaced to the caller
//! - [`ReceiveError`]: per-datagram failures, logged and dropped by the
//!   receive loop

use std::io;

use murmur_crypto::CryptoError;
use murmur_proto::{ProtocolError, SchemeKind};
use thiserror::Error;

use crate::directory::Endpoint;

/// Errors from session setup and the send path.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Envelope or message encoding failed
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Sealing or key handling failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A datagram could not be handed to the network
    #[error("transmission to {endpoint} failed: {reason}")]
    Transmission {
        /// Destination that failed
        endpoint: Endpoint,
        /// Underlying I/O error text
        reason: String,
    },

    /// A peer's configured key is missing or unusable
    #[error("invalid key material for peer {peer}: {reason}")]
    InvalidKeyMaterial {
        /// Alias of the offending peer
        peer: String,
        /// What was wrong with the key
        reason: String,
    },

    /// Two peers share an alias
    #[error("duplicate peer alias: {0}")]
    DuplicatePeer(String),

    /// A peer or endpoint string could not be parsed
    #[error("invalid endpoint {input:?}: {reason}")]
    InvalidEndpoint {
        /// The rejected text
        input: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Transport setup failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// Returns true if the session can keep running after this error.
    ///
    /// Transmission failures affect one peer for one message. Oversized
    /// messages affect one message. Everything else is a setup problem.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transmission { .. } => true,
            Self::Crypto(err) => matches!(err, CryptoError::PayloadTooLarge { .. }),
            _ => false,
        }
    }

    /// Returns true if a ciphertext failed to open.
    pub fn is_confidentiality_failure(&self) -> bool {
        matches!(self, Self::Crypto(err) if err.is_confidentiality_failure())
    }
}

/// Why an inbound datagram was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    /// Bytes are not a well-formed envelope
    #[error("malformed envelope: {0}")]
    Malformed(ProtocolError),

    /// Envelope was produced under a different confidentiality scheme
    #[error("scheme mismatch: expected {expected}, got {actual}")]
    SchemeMismatch {
        /// Our session's scheme
        expected: SchemeKind,
        /// Scheme named in the envelope header
        actual: SchemeKind,
    },

    /// Payload did not open under our key
    #[error("confidentiality failure: {0}")]
    Confidentiality(CryptoError),

    /// Opened payload is not a valid message
    #[error("invalid message: {0}")]
    InvalidMessage(ProtocolError),
}

impl ReceiveError {
    /// Pipeline stage that rejected the datagram, for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed envelope",
            Self::SchemeMismatch { .. } | Self::Confidentiality(_) => "confidentiality",
            Self::InvalidMessage(_) => "invalid message",
        }
    }

    /// Returns true if the payload could not be opened by our scheme.
    pub fn is_confidentiality_failure(&self) -> bool {
        matches!(self, Self::SchemeMismatch { .. } | Self::Confidentiality(_))
    }

    /// Every receive error is confined to one datagram.
    pub fn is_recoverable(&self) -> bool {
        true
    }
}
