//! Build script for gatekit-server.
//!
//! Generates the typed `gatekit.greeter.Greeter` service, which serves the
//! Greeter messages directly without an envelope.

use tonic_build::manual::{Builder, Method, Service};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // rpc SayHello(HelloRequest) returns (HelloReply);
    let greeter = Service::builder()
        .name("Greeter")
        .package("gatekit.greeter")
        .method(
            Method::builder()
                .name("say_hello")
                .route_name("SayHello")
                .input_type("crate::greeter::HelloRequest")
                .output_type("crate::greeter::HelloReply")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    Builder::new().compile(&[greeter]);
}
