//! MCP server core for bossman
//!
//! Self-contained JSON-RPC 2.0 implementation: no external JSON-RPC
//! or MCP SDK crates. The pieces, bottom up:
//!
//! - [`protocol`] — wire message types and the closed protocol error set
//! - [`transport`] — newline-delimited framing over async byte streams,
//!   single messages and batches
//! - [`server`] — lifecycle state machine, dispatch, in-flight request
//!   cancellation, and the [`server::ToolHandler`] boundary
//! - [`tools`] — the task/dependency tool catalogue served to clients
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bossman_core::TaskStore;
//! use bossman_mcp::{McpServer, Registry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(TaskStore::in_memory()?);
//!     let server = McpServer::new(Registry::new(store));
//!     server.run_stdio().await
//! }
//! ```

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

// Re-exports for convenience
pub use protocol::{ContentBlock, Request, RequestId, Response, RpcError, ToolDefinition, ToolResult};
pub use server::{McpServer, ServerState, ToolHandler};
pub use tools::Registry;
pub use transport::{MessageReader, MessageWriter, ReadError};
