//! Logical chat message carried inside a sealed envelope payload.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// One chat line: who said it and what they said.
///
/// Encoded as a CBOR map before sealing. Decoding requires both fields to be
/// present and to be text strings; anything else is rejected rather than
/// guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Display alias of the sender
    pub alias: String,

    /// Message body
    pub text: String,
}

impl Message {
    /// Create a new message
    pub fn new(alias: impl Into<String>, text: impl Into<String>) -> Self {
        Self { alias: alias.into(), text: text.into() }
    }

    /// Serialize to CBOR bytes
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::CborEncode`] if serialization fails.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::CborDecode`] if the bytes are not exactly one
    /// CBOR map with text `alias` and `text` fields.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let message = ciborium::de::from_reader(&mut cursor)
            .map_err(|e| ProtocolError::CborDecode(e.to_string()))?;

        if !cursor.is_empty() {
            return Err(ProtocolError::CborDecode(format!(
                "{} trailing bytes after message",
                cursor.len()
            )));
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn cbor_round_trip(alias in ".{0,32}", text in ".{0,256}") {
            let message = Message::new(alias, text);
            let bytes = message.to_cbor().expect("should encode");
            prop_assert_eq!(Message::from_cbor(&bytes).expect("should decode"), message);
        }
    }

    #[test]
    fn missing_field_rejected() {
        #[derive(Serialize)]
        struct AliasOnly {
            alias: String,
        }

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&AliasOnly { alias: "a".into() }, &mut bytes).unwrap();

        assert!(matches!(Message::from_cbor(&bytes), Err(ProtocolError::CborDecode(_))));
    }

    #[test]
    fn wrong_field_type_rejected() {
        #[derive(Serialize)]
        struct NumericText {
            alias: String,
            text: u64,
        }

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&NumericText { alias: "a".into(), text: 7 }, &mut bytes)
            .unwrap();

        assert!(Message::from_cbor(&bytes).is_err());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = Message::new("a", "hi").to_cbor().unwrap();
        bytes.extend_from_slice(b"GARBAGE");

        assert_eq!(
            Message::from_cbor(&bytes),
            Err(ProtocolError::CborDecode("7 trailing bytes after message".into()))
        );
    }

    #[test]
    fn second_message_is_trailing() {
        let mut bytes = Message::new("a", "one").to_cbor().unwrap();
        bytes.extend(Message::new("a", "two").to_cbor().unwrap());

        assert!(matches!(Message::from_cbor(&bytes), Err(ProtocolError::CborDecode(_))));
    }

    #[test]
    fn garbage_rejected() {
        assert!(Message::from_cbor(&[0xFF, 0x00, 0x13]).is_err());
        assert!(Message::from_cbor(&[]).is_err());
    }
}
