//! Things MCP - Things 3 todos over AppleScript, with idempotent bulk operations

use clap::Parser;
use rmcp::{transport::io::stdio, ServiceExt};
use std::path::PathBuf;

use things_mcp::{telemetry, Config, ThingsMcpServer};

#[derive(Parser, Debug)]
#[command(name = "things-mcp", version, about = "MCP server for Things 3")]
struct Args {
    /// Path to a TOML config file
    #[arg(long, env = "THINGS_MCP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing("things_mcp")?;
    let args = Args::parse();

    tracing::info!("Starting Things MCP server");

    let config = Config::load(args.config.as_deref());
    let server = ThingsMcpServer::new(&config);
    let service = server.clone().serve(stdio()).await?;

    tracing::info!("Things MCP server running");

    service.waiting().await?;
    server.close();

    tracing::info!("Things MCP server stopped");

    Ok(())
}
