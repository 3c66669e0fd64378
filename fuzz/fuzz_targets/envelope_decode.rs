//! Arbitrary datagrams through the envelope decoder.
//!
//! Decoding must return an error for anything malformed and never panic. A
//! datagram that does decode must re-encode to the same bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = Envelope::decode(data) {
        let encoded = envelope.to_bytes().expect("decoded envelope must re-encode");
        assert_eq!(&encoded[..], data);
    }
});
