//! Exhaustive positive space for envelope encoding and decoding.
//!
//! Covers every scheme against edge-case clock values and payload sizes,
//! with the fuzzer input choosing the payload bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_proto::{Envelope, EnvelopeHeader, SchemeKind};

const CLOCKS: &[u64] = &[0, 1, 0x1000, u32::MAX as u64, u64::MAX / 2, u64::MAX - 1, u64::MAX];

const PAYLOAD_SIZES: &[usize] = &[0, 1, 19, 20, 190, 256, 1024];

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let scheme = SchemeKind::ALL[data[0] as usize % SchemeKind::ALL.len()];
    let body = &data[1..];

    for &clock in CLOCKS {
        for &size in PAYLOAD_SIZES {
            let payload = if size <= body.len() { body[..size].to_vec() } else { vec![0u8; size] };
            let envelope = Envelope::new(scheme, clock, payload.clone());

            let encoded =
                envelope.to_bytes().expect("encode should never fail below the size limit");
            assert_eq!(encoded.len(), EnvelopeHeader::SIZE + size);

            let decoded =
                Envelope::decode(&encoded).expect("decode should succeed for valid encoding");
            assert_eq!(decoded.scheme, scheme);
            assert_eq!(decoded.clock, clock);
            assert_eq!(&decoded.payload[..], &payload[..]);
        }
    }
});
