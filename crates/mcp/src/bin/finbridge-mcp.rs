// Standalone finance tool host binary (MCP over stdio)

use anyhow::Result;
use finbridge_mcp::server::McpServer;
use finbridge_mcp::tools::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing on stderr; stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("finbridge tool host starting...");

    let yahoo = Arc::new(YahooClient::new()?);

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(HistoricalPricesTool::new(yahoo.clone())));
    registry.register(Arc::new(StockInfoTool::new(yahoo.clone())));
    registry.register(Arc::new(NewsTool::new(yahoo)));

    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    server.start().await?;

    Ok(())
}
