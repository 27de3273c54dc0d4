//! The gateway process: gRPC, REST and WebSocket adapters over one routing table.
//!
//! ```bash
//! gatekit-gateway --config gateway.json --log-format json
//! ```

use clap::Parser;
use gatekit::app::GatewayApp;
use gatekit::cli::GatewayArgs;
use gatekit::error::ServeError;
use gatekit::logging::init_tracing;
use gatekit::supervisor::shutdown_signal;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = GatewayArgs::parse();
    init_tracing(args.log_format).map_err(|e| ServeError::Logging(e.to_string()))?;

    let config = args.load_config().map_err(ServeError::from)?;
    let app = GatewayApp::bind(config).await?;
    app.run_until(shutdown_signal()).await?;
    Ok(())
}
