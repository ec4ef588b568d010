//! Tilemux gateway: entry point.
//!
//! Loads configuration (file, then `TILEMUX__*` environment variables, then
//! command-line flags) and starts the axum-based gateway.
//!
//! Logging is controlled by `RUST_LOG`; the default directive is
//! `tilemux_gateway=info`.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tilemux_gateway::config::GatewayServerConfig;
use tilemux_gateway::server::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Tilemux gateway - job-affinity proxy for image-processing nodes
#[derive(Parser)]
#[command(name = "tilemux-gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (yaml, toml or json)
    #[arg(short = 'c', long, env = "TILEMUX_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind, overrides the configuration file
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = GatewayServerConfig::load(cli.config.as_deref())
        .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!(
        host = %config.host,
        port = config.port,
        nodes = config.nodes.len(),
        spool_dir = %config.spool_dir.display(),
        "Tilemux gateway configuration loaded"
    );

    GatewayServer::new(config).start().await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tilemux_gateway=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
