//! Fuzz target for the JSON envelope form.
//!
//! Arbitrary bytes must decode to an envelope or fail with an error, never
//! panic. Anything that decodes must survive a re-encode.

#![no_main]

use gatekit_core::{EnvelopeReply, EnvelopeRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = EnvelopeRequest::decode_json(data) {
        let encoded = request.encode_json().expect("decoded request re-encodes");
        let again = EnvelopeRequest::decode_json(&encoded).expect("re-encoded request decodes");
        assert_eq!(request, again);
    }

    let _ = EnvelopeReply::decode_json(data);

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<EnvelopeRequest>(s);
    }
});
