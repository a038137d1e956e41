//! XrayBridge - Main entry point
//!
//! REST bridge for Xray inbounds with subscription link generation

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use xraybridge::{BridgeConfig, BridgeServer, ConfigFileSource, ListenAddr};

/// XrayBridge - REST bridge for Xray inbounds
#[derive(Parser, Debug)]
#[command(name = "xraybridge")]
#[command(author = "XrayBridge Contributors")]
#[command(version)]
#[command(about = "REST bridge for Xray inbounds with subscription link generation")]
struct Args {
    /// Listen address: host:port, :port, /path/to.sock or @abstract
    #[arg(long, env = "XRAY_API_BRIDGE_LISTEN", default_value = "127.0.0.1:8081")]
    listen: ListenAddr,

    /// Xray config file whose inbounds are advertised
    #[arg(long, env = "XRAY_API_BRIDGE_INBOUNDS")]
    inbounds: PathBuf,

    /// Subscription profile file (JSON with comments)
    #[arg(long, env = "XRAY_API_BRIDGE_SUBS_CONFIG")]
    subs_config: Option<PathBuf>,

    /// Query token that selects every client
    #[arg(long, env = "XRAY_API_BRIDGE_SUBS_SUPERKEY", hide_env_values = true)]
    subs_superkey: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting XrayBridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Inbounds from: {}", args.inbounds.display());

    let subs_config = args.subs_config.filter(|p| !p.as_os_str().is_empty());
    match &subs_config {
        Some(path) => info!("Subscription profiles from: {}", path.display()),
        None => warn!("XRAY_API_BRIDGE_SUBS_CONFIG not set, /subscription is disabled"),
    }

    let config = BridgeConfig {
        listen: args.listen,
        subs_config,
        superkey: args.subs_superkey.filter(|k| !k.is_empty()),
    };

    let source = Arc::new(ConfigFileSource::new(&args.inbounds));
    let server = Arc::new(BridgeServer::new(config, source));

    server.run().await.context("HTTP server failed")?;

    info!("XrayBridge stopped");
    Ok(())
}
