//! The reference Greeter backend.
//!
//! Serves `SayHello` (command 1000) as an envelope backend and as the typed
//! `gatekit.greeter.Greeter/SayHello` RPC.

use clap::Parser;
use gatekit::app::BackendApp;
use gatekit::cli::GreeterArgs;
use gatekit::error::ServeError;
use gatekit::greeter_dispatcher;
use gatekit::logging::init_tracing;
use gatekit::supervisor::shutdown_signal;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = GreeterArgs::parse();
    init_tracing(args.log_format).map_err(|e| ServeError::Logging(e.to_string()))?;

    let app = BackendApp::bind(&args.addr, greeter_dispatcher()).await?;
    app.run_until(shutdown_signal()).await?;
    Ok(())
}
