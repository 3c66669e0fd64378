//! Arbitrary bytes through the CBOR message decoder.

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_proto::Message;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = Message::from_cbor(data) {
        let encoded = message.to_cbor().expect("decoded message must re-encode");
        let again = Message::from_cbor(&encoded).expect("re-encoded message must decode");
        assert_eq!(again, message);
    }
});
