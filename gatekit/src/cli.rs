//! Command-line flags shared by the binaries.
//!
//! Every flag can also be set through a `GATEKIT_*` environment variable.
//! Flags override values read from the config file.

use std::path::PathBuf;

use clap::Parser;
use gatekit_core::{ConfigError, GatewayConfig};

use crate::logging::LogFormat;

/// Default listen address of the Greeter backend.
pub const DEFAULT_GREETER_ADDR: &str = "0.0.0.0:50052";

/// Flags of `gatekit-gateway`.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Protocol gateway for envelope-based gRPC backends")]
pub struct GatewayArgs {
    /// JSON config file. Defaults reproduce the reference deployment.
    #[arg(long, env = "GATEKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// gRPC listener address.
    #[arg(long, env = "GATEKIT_GRPC_ADDR")]
    pub grpc_addr: Option<String>,

    /// HTTP and WebSocket listener address.
    #[arg(long, env = "GATEKIT_HTTP_ADDR")]
    pub http_addr: Option<String>,

    /// Backend call deadline in milliseconds.
    #[arg(long, env = "GATEKIT_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Log output format.
    #[arg(long, env = "GATEKIT_LOG_FORMAT", value_enum, default_value_t)]
    pub log_format: LogFormat,
}

impl GatewayArgs {
    /// Load the config file (if any), apply flag overrides, and validate.
    pub fn load_config(&self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::from_json_file(path)?,
            None => GatewayConfig::default(),
        };
        if let Some(addr) = &self.grpc_addr {
            config.grpc_addr.clone_from(addr);
        }
        if let Some(addr) = &self.http_addr {
            config.http_addr.clone_from(addr);
        }
        if let Some(ms) = self.timeout_ms {
            config.invoke_timeout_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Flags of `gatekit-greeter`.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Reference Greeter backend")]
pub struct GreeterArgs {
    /// gRPC listener address.
    #[arg(long, env = "GATEKIT_GREETER_ADDR", default_value = DEFAULT_GREETER_ADDR)]
    pub addr: String,

    /// Log output format.
    #[arg(long, env = "GATEKIT_LOG_FORMAT", value_enum, default_value_t)]
    pub log_format: LogFormat,
}
