//! MCP server launcher
//!
//! Starts the MCP server over stdio.

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};

use crate::config::load_config;
use crate::mcp::MixhubServer;

/// Run the MCP server over stdio.
///
/// stdout carries the protocol, so nothing else may print to it while
/// the server is running.
///
/// # Arguments
/// * `config_path` - Optional path to a config file override
pub async fn run_mcp_server(config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path).context("Failed to load configuration")?;

    let server = MixhubServer::with_config(config);

    // Create stdio transport - tuple of (reader, writer)
    let transport = (stdin(), stdout());

    tracing::debug!("Serving MCP over stdio");
    let service = server.serve(transport).await?;

    service.waiting().await?;

    Ok(())
}
