//! The tool catalogue: eight task and dependency tools over the store.

mod blockers;
mod registry;
mod tasks;

pub use registry::{Registry, Tool};

use anyhow::{anyhow, bail, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::protocol::ToolResult;

/// Parse a tool's arguments from the opaque payload. Failures are
/// execution errors, not protocol errors.
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| anyhow!("invalid arguments: {}", e))
}

/// Cooperative cancellation check; the store operations themselves are
/// short enough not to need one mid-flight.
fn check_cancelled(scope: &CancellationToken) -> Result<()> {
    if scope.is_cancelled() {
        bail!("cancelled");
    }
    Ok(())
}

/// Serialize a domain value as the single text block of a successful result.
fn result_json<T: serde::Serialize>(value: &T) -> Result<ToolResult> {
    Ok(ToolResult::text(serde_json::to_string(value)?))
}
