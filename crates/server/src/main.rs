//! speclens MCP server entry point.
//!
//! Serves the spec registry tools over stdio. Logs go to stderr; stdout
//! belongs to the MCP transport.

mod service;

use anyhow::Context as _;
use clap::Parser;
use rmcp::ServiceExt as _;
use rmcp::transport::stdio;
use service::SpecServer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "speclens-server", version, about = "MCP server for inspecting OpenAPI/Swagger specs")]
struct Cli {
    /// Load a spec before serving, as NAME=SOURCE (path or URL). Repeatable.
    #[arg(long = "preload", value_name = "NAME=SOURCE")]
    preload: Vec<String>,

    /// Log filter when RUST_LOG is not set (e.g. "info", "speclens=debug").
    #[arg(long, env = "SPECLENS_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = SpecServer::new();
    for entry in &cli.preload {
        let (name, source) = entry
            .split_once('=')
            .with_context(|| format!("invalid --preload '{entry}', expected NAME=SOURCE"))?;
        server
            .load_and_register(name, source)
            .await
            .with_context(|| format!("failed to preload spec '{name}'"))?;
    }

    tracing::info!("serving MCP over stdio");
    let running = server
        .serve(stdio())
        .await
        .context("failed to start MCP stdio transport")?;
    running.waiting().await.context("MCP server terminated")?;
    Ok(())
}
