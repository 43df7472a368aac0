//! bossman-http - read-only HTTP dashboard over the task store.
//!
//! Serves the same records the MCP tools return, for humans and
//! scripts that just want to look. All mutation goes through the MCP
//! server or the CLI.

mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use bossman_core::{config, TaskStore};

const DEFAULT_ADDR: &str = "127.0.0.1:6969";

#[tokio::main]
async fn main() -> Result<()> {
    config::init_tracing();

    let db_path = config::prepare_db_path().context("prepare data directory")?;
    let store = TaskStore::open(&db_path)
        .with_context(|| format!("open task store at {}", db_path.display()))?;

    let app = api::router(Arc::new(store));

    let addr: SocketAddr = std::env::var("BOSSMAN_HTTP_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .context("parse BOSSMAN_HTTP_ADDR")?;

    tracing::info!(%addr, "dashboard listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
