//! Build script for gatekit-transport.
//!
//! Generates the tonic client and server stubs for the gateway and backend
//! services. The message types are hand-written prost structs in
//! `gatekit_core::wire`, so the services are described with tonic-build's
//! manual builder and no protoc is needed.

use tonic_build::manual::{Builder, Method, Service};

const REQUEST_TYPE: &str = "gatekit_core::wire::EnvelopeRequest";
const REPLY_TYPE: &str = "gatekit_core::wire::EnvelopeReply";
const CODEC: &str = "tonic::codec::ProstCodec";

fn handle_envelope() -> Method {
    Method::builder()
        .name("handle_envelope")
        .route_name("HandleEnvelope")
        .input_type(REQUEST_TYPE)
        .output_type(REPLY_TYPE)
        .codec_path(CODEC)
        .build()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // rpc HandleEnvelope(EnvelopeRequest) returns (EnvelopeReply);
    // rpc HandleEnvelopeStream(stream EnvelopeRequest) returns (stream EnvelopeReply);
    let gateway = Service::builder()
        .name("EnvelopeGateway")
        .package("gatekit.gateway")
        .method(handle_envelope())
        .method(
            Method::builder()
                .name("handle_envelope_stream")
                .route_name("HandleEnvelopeStream")
                .input_type(REQUEST_TYPE)
                .output_type(REPLY_TYPE)
                .codec_path(CODEC)
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    // rpc HandleEnvelope(EnvelopeRequest) returns (EnvelopeReply);
    let backend = Service::builder()
        .name("EnvelopeBackend")
        .package("gatekit.backend")
        .method(handle_envelope())
        .build();

    Builder::new().compile(&[gateway, backend]);
}
