//! Arbitrary sealed payloads through the symmetric scheme.
//!
//! Opening must reject forged or truncated input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_crypto::{SharedKey, SymmetricShared};

fuzz_target!(|data: &[u8]| {
    let key = SharedKey::derive("Fuzz-K3y!").expect("fixed passphrase is valid");
    let cipher = SymmetricShared::new(&key);

    assert!(cipher.open(data).is_err(), "forged payload opened");
});
