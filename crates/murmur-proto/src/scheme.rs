//! Confidentiality scheme tags.
//!
//! The tag travels in the envelope header so a receiver can drop envelopes
//! sealed under a scheme it is not running before attempting to open them.

use std::fmt;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Which confidentiality scheme sealed an envelope's payload.
///
/// Serialized as a single byte in the envelope header. The `#[repr(u8)]`
/// keeps the numeric values stable for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SchemeKind {
    /// Payload is the serialized message, unencrypted
    Plaintext = 0x00,
    /// Payload is sealed to one recipient's RSA public key
    AsymmetricPerPeer = 0x01,
    /// Payload is sealed with a key shared by the whole group
    SymmetricShared = 0x02,
}

impl SchemeKind {
    /// All schemes, in tag order.
    pub const ALL: [Self; 3] = [Self::Plaintext, Self::AsymmetricPerPeer, Self::SymmetricShared];

    /// Convert to wire byte
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from wire byte, `None` for unknown tags
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Plaintext),
            0x01 => Some(Self::AsymmetricPerPeer),
            0x02 => Some(Self::SymmetricShared),
            _ => None,
        }
    }

    /// Short lowercase name, as used on the command line
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::AsymmetricPerPeer => "asymmetric",
            Self::SymmetricShared => "symmetric",
        }
    }

    /// Whether each peer needs its own key material
    #[must_use]
    pub fn is_per_peer(self) -> bool {
        matches!(self, Self::AsymmetricPerPeer)
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
