//! Fuzz target for the protobuf envelope form.

#![no_main]

use gatekit_core::{EnvelopeReply, EnvelopeRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = EnvelopeRequest::decode_binary(data) {
        let again = EnvelopeRequest::decode_binary(&request.encode_binary())
            .expect("re-encoded request decodes");
        assert_eq!(request, again);
    }

    if let Ok(reply) = EnvelopeReply::decode_binary(data) {
        let again = EnvelopeReply::decode_binary(&reply.encode_binary())
            .expect("re-encoded reply decodes");
        assert_eq!(reply, again);
    }
});
