//! bossman-mcp - stdio MCP server over the bossman task store.
//!
//! Launched by an AI client as a subprocess; speaks newline-framed
//! JSON-RPC 2.0 on stdin/stdout. Diagnostics go to stderr only.

use std::sync::Arc;

use anyhow::{Context, Result};

use bossman_core::{config, TaskStore};
use bossman_mcp::server::McpServer;
use bossman_mcp::tools::Registry;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_tracing();

    let db_path = config::prepare_db_path().context("prepare data directory")?;
    tracing::info!(path = %db_path.display(), "opening task store");
    let store = TaskStore::open(&db_path)
        .with_context(|| format!("open task store at {}", db_path.display()))?;

    let server = McpServer::new(Registry::new(Arc::new(store)));
    server.run_stdio().await
}
