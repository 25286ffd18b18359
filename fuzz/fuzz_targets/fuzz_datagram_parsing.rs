//! Fuzz target for radio datagram decoding.
//!
//! Arbitrary bytes must never panic the decoder, and anything it accepts must
//! re-encode into a single datagram.

#![no_main]

use libfuzzer_sys::fuzz_target;

use fieldstate::__internal::{decode_message, encode_message, MAX_DATAGRAM_SIZE};

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = decode_message(data) {
        let bytes = encode_message(&message).expect("decoded datagram must re-encode");
        assert!(bytes.len() <= MAX_DATAGRAM_SIZE);
        assert_eq!(decode_message(&bytes).ok(), Some(message));
    }
});
