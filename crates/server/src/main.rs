use anyhow::{Context, Result};
use clap::Parser;
use finbridge_mcp::Session;
use std::path::PathBuf;
use std::sync::Arc;

mod api;
mod config;

use config::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "finbridge")]
#[command(about = "HTTP/JSON-RPC bridge to the finance tool host", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "finbridge.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Working directory for the tool host subprocess
    #[arg(long, env = "MCP_DIR")]
    mcp_dir: Option<PathBuf>,

    /// Command used to launch the tool host
    #[arg(long, env = "SERVER_CMD")]
    server_cmd: Option<String>,

    /// Arguments for the tool host command, space separated
    #[arg(long, env = "SERVER_ARGS")]
    server_args: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finbridge=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Starting finbridge");

    let mut config = ServerConfig::load(&args.config)?;
    if let Some(dir) = args.mcp_dir {
        config.tool_host.dir = dir;
    }
    if let Some(command) = args.server_cmd {
        config.tool_host.command = command;
    }
    if let Some(server_args) = args.server_args {
        config.tool_host.args = server_args
            .split_whitespace()
            .map(str::to_string)
            .collect();
    }

    // Spawn the tool host and finish the handshake before accepting any
    // traffic; a request can never see an uninitialized session.
    let session = Session::spawn(config.session_config())
        .await
        .context("Failed to start tool host session")?;
    let state = AppState::new(Arc::new(session));

    let addr = format!("{}:{}", args.host, args.port);
    api::serve(&addr, state).await?;

    Ok(())
}
