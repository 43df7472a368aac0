//! MCP server: lifecycle state machine, dispatch, cancellation.
//!
//! A single reader loop drives the server. Routing — state checks and
//! transitions, notification side effects, in-flight registration —
//! happens inline per framed line, but tool execution (single or
//! batched) runs on spawned tasks so the loop keeps reading and a
//! later `notifications/cancelled` can land while a tool is still
//! working. All writes funnel through the transport's shared writer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::protocol::{
    CancelParams, EmptyObject, InitializeResult, Request, RequestId, Response, RpcError,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolDefinition, ToolResult, JSONRPC_VERSION,
};
use crate::transport::{MessageReader, MessageWriter, ReadError};

/// Server information
const SERVER_NAME: &str = "bossman";
const SERVER_VERSION: &str = "0.1.0";
const PROTOCOL_VERSION: &str = "2025-03-26";

/// Lifecycle states. Monotonic: a server never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Initializing,
    Operating,
    Shutdown,
}

/// The boundary a protocol-agnostic tool plugin must provide.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Enumerate the tool descriptors served by tools/list
    fn list_tools(&self) -> Vec<ToolDefinition>;

    /// Invoke a tool by name. `scope` is cancelled when the client
    /// cancels the request; long-running tools must honour it.
    /// An Err is an execution failure, reported to the client as an
    /// `isError` result — not a protocol error.
    async fn call_tool(
        &self,
        scope: CancellationToken,
        name: &str,
        arguments: Value,
    ) -> anyhow::Result<ToolResult>;
}

/// State and in-flight table, guarded together so that observing the
/// state and deciding on dispatch is one critical section. Never held
/// across a tool invocation.
struct Lifecycle {
    state: ServerState,
    inflight: HashMap<RequestId, CancellationToken>,
}

/// Where a routed message goes
enum Routed {
    /// Immediate response
    Reply(Response),
    /// Notification (or dropped message): nothing to send
    Silent,
    /// A state-checked tools/call, already registered in the in-flight
    /// table, ready to execute
    ToolCall {
        id: RequestId,
        params: ToolCallParams,
        token: CancellationToken,
    },
}

/// MCP server over a [`ToolHandler`]
pub struct McpServer<H> {
    handler: Arc<H>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl<H> Clone for McpServer<H> {
    fn clone(&self) -> Self {
        McpServer {
            handler: Arc::clone(&self.handler),
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl<H: ToolHandler + 'static> McpServer<H> {
    pub fn new(handler: H) -> Self {
        McpServer {
            handler: Arc::new(handler),
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                state: ServerState::Created,
                inflight: HashMap::new(),
            })),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServerState {
        self.lifecycle.lock().unwrap().state
    }

    /// Run the server over stdin/stdout
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Main loop. Returns Ok on clean shutdown (input EOF); a parse
    /// failure answers -32700 and continues; only a transport failure
    /// is fatal.
    pub async fn run<R, W>(&self, input: R, output: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("mcp server reading from input");
        let mut reader = MessageReader::new(input);
        let writer = MessageWriter::new(output);

        loop {
            match reader.read_message().await {
                Err(ReadError::Eof) => {
                    self.lifecycle.lock().unwrap().state = ServerState::Shutdown;
                    info!("input closed, shutting down");
                    return Ok(());
                }
                Err(ReadError::Parse(msg)) => {
                    warn!(%msg, "unparseable message");
                    let response = Response::error(RequestId::Null, RpcError::ParseError(msg));
                    writer.write_response(&response).await?;
                }
                Err(ReadError::Io(err)) => {
                    error!(%err, "transport failure");
                    return Err(err.into());
                }
                Ok((requests, true)) => {
                    // Route every item inline so state transitions,
                    // notification side effects, and in-flight
                    // registration stay ordered with later lines; the
                    // tool invocations themselves must not block the
                    // reader, or a cancellation could never be read.
                    let routed: Vec<Routed> =
                        requests.into_iter().map(|request| self.route(request)).collect();
                    let server = self.clone();
                    let writer = writer.clone();
                    tokio::spawn(async move {
                        let mut responses = Vec::new();
                        for routed in routed {
                            match routed {
                                Routed::Reply(response) => responses.push(response),
                                Routed::Silent => {}
                                Routed::ToolCall { id, params, token } => {
                                    if let Some(response) =
                                        server.execute_tool_call(id, params, token).await
                                    {
                                        responses.push(response);
                                    }
                                }
                            }
                        }
                        if let Err(err) = writer.write_batch_response(&responses).await {
                            error!(%err, "failed to write batch response");
                        }
                    });
                }
                Ok((requests, false)) => {
                    let Some(request) = requests.into_iter().next() else {
                        continue;
                    };
                    match self.route(request) {
                        Routed::Reply(response) => writer.write_response(&response).await?,
                        Routed::Silent => {}
                        Routed::ToolCall { id, params, token } => {
                            // Run concurrently so the loop can still see a
                            // cancellation for this id; the task writes its
                            // own response through the shared writer.
                            let server = self.clone();
                            let writer = writer.clone();
                            tokio::spawn(async move {
                                if let Some(response) =
                                    server.execute_tool_call(id, params, token).await
                                {
                                    if let Err(err) = writer.write_response(&response).await {
                                        error!(%err, "failed to write tool response");
                                    }
                                }
                            });
                        }
                    }
                }
            }
        }
    }

    /// Route one parsed message. State is observed (and any transition
    /// applied) under a single lock acquisition.
    fn route(&self, request: Request) -> Routed {
        let Some(id) = request.id.clone() else {
            self.handle_notification(request);
            return Routed::Silent;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Routed::Reply(Response::error(
                id,
                RpcError::InvalidRequest(format!(
                    "unsupported jsonrpc version: {:?}",
                    request.jsonrpc
                )),
            ));
        }
        if id == RequestId::Null {
            return Routed::Reply(Response::error(
                RequestId::Null,
                RpcError::InvalidRequest("request id must not be null".to_string()),
            ));
        }
        if request.method.is_empty() {
            return Routed::Reply(Response::error(
                id,
                RpcError::InvalidRequest("empty method".to_string()),
            ));
        }

        let mut lifecycle = self.lifecycle.lock().unwrap();
        match request.method.as_str() {
            "initialize" => {
                if lifecycle.state != ServerState::Created {
                    return Routed::Reply(Response::error(
                        id,
                        RpcError::InvalidRequest("already initialized".to_string()),
                    ));
                }
                lifecycle.state = ServerState::Initializing;
                drop(lifecycle);
                info!("initialize accepted");
                Routed::Reply(self.initialize_response(id))
            }
            "ping" => Routed::Reply(Response::success(id, json!({}))),
            "tools/list" => {
                if lifecycle.state != ServerState::Operating {
                    return Routed::Reply(Response::error(
                        id,
                        RpcError::InvalidRequest("server not initialized".to_string()),
                    ));
                }
                drop(lifecycle);
                Routed::Reply(self.tools_list_response(id))
            }
            "tools/call" => {
                if lifecycle.state != ServerState::Operating {
                    return Routed::Reply(Response::error(
                        id,
                        RpcError::InvalidRequest("server not initialized".to_string()),
                    ));
                }
                let params: ToolCallParams =
                    match serde_json::from_value(request.params.unwrap_or(Value::Null)) {
                        Ok(params) => params,
                        Err(err) => {
                            return Routed::Reply(Response::error(
                                id,
                                RpcError::InvalidParams(err.to_string()),
                            ))
                        }
                    };
                // Register before the invocation begins, still under the
                // routing lock: a cancellation read by the loop right
                // after this message must find the entry.
                let token = CancellationToken::new();
                lifecycle.inflight.insert(id.clone(), token.clone());
                Routed::ToolCall { id, params, token }
            }
            method => {
                warn!(%method, "unknown method");
                Routed::Reply(Response::error(
                    id,
                    RpcError::MethodNotFound(method.to_string()),
                ))
            }
        }
    }

    /// Notifications never produce a response; malformed ones are dropped.
    fn handle_notification(&self, request: Request) {
        if request.jsonrpc != JSONRPC_VERSION {
            return;
        }
        match request.method.as_str() {
            "notifications/initialized" => {
                let mut lifecycle = self.lifecycle.lock().unwrap();
                if lifecycle.state == ServerState::Initializing {
                    lifecycle.state = ServerState::Operating;
                    info!("client initialized, now operating");
                }
            }
            "notifications/cancelled" => {
                let Some(params) = request.params else { return };
                let Ok(cancel) = serde_json::from_value::<CancelParams>(params) else {
                    return;
                };
                let token = {
                    let mut lifecycle = self.lifecycle.lock().unwrap();
                    lifecycle.inflight.remove(&cancel.request_id)
                };
                // Unknown or already-completed ids are ignored.
                if let Some(token) = token {
                    debug!(id = ?cancel.request_id, reason = ?cancel.reason, "cancelling request");
                    token.cancel();
                }
            }
            method => debug!(%method, "ignoring notification"),
        }
    }

    fn initialize_response(&self, id: RequestId) -> Response {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(EmptyObject {}),
                logging: Some(EmptyObject {}),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };
        match serde_json::to_value(&result) {
            Ok(value) => Response::success(id, value),
            Err(err) => Response::error(id, RpcError::InternalError(err.to_string())),
        }
    }

    fn tools_list_response(&self, id: RequestId) -> Response {
        let tools = self.handler.list_tools();
        match serde_json::to_value(&tools) {
            Ok(value) => Response::success(id, json!({ "tools": value })),
            Err(err) => Response::error(id, RpcError::InternalError(err.to_string())),
        }
    }

    /// Execute a tools/call whose state check passed and whose
    /// in-flight entry is registered.
    ///
    /// Returns None when a cancellation won the race: the in-flight
    /// entry is removed exactly once, by either the completing call or
    /// the cancellation notification, and a call that finds its entry
    /// gone must stay silent.
    async fn execute_tool_call(
        &self,
        id: RequestId,
        params: ToolCallParams,
        token: CancellationToken,
    ) -> Option<Response> {
        debug!(tool = %params.name, id = ?id, "calling tool");
        let outcome = self
            .handler
            .call_tool(token, &params.name, params.arguments)
            .await;

        let completed = self.lifecycle.lock().unwrap().inflight.remove(&id).is_some();
        if !completed {
            debug!(id = ?id, "request cancelled, dropping result");
            return None;
        }

        let result = match outcome {
            Ok(result) => result,
            // Alternate formatting flattens the whole context chain
            // ("insert task: CHECK constraint failed: ..."), so the
            // client sees the underlying reason, not just the label.
            Err(err) => ToolResult::error(format!("{:#}", err)),
        };
        match serde_json::to_value(&result) {
            Ok(value) => Some(Response::success(id, value)),
            Err(err) => Some(Response::error(id, RpcError::InternalError(err.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Handler with one tool per behavior the protocol needs exercised.
    struct TestHandler;

    #[async_trait]
    impl ToolHandler for TestHandler {
        fn list_tools(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the arguments back".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {},
                    "required": [],
                    "additionalProperties": false
                }),
            }]
        }

        async fn call_tool(
            &self,
            scope: CancellationToken,
            name: &str,
            arguments: Value,
        ) -> anyhow::Result<ToolResult> {
            match name {
                "echo" => Ok(ToolResult::text(arguments.to_string())),
                "fail" => bail!("boom"),
                // Parks until cancelled, so a cancellation test is
                // deterministic: the tool only returns once the
                // notification has been processed.
                "block" => {
                    scope.cancelled().await;
                    Ok(ToolResult::text("too late"))
                }
                other => bail!("unknown tool: {}", other),
            }
        }
    }

    /// Feed `input` to a fresh server, close the stream, and collect
    /// every line it wrote.
    async fn session(input: &str) -> Vec<Value> {
        let (mut client, server_io) = tokio::io::duplex(1 << 20);
        let (server_read, server_write) = tokio::io::split(server_io);

        let server = McpServer::new(TestHandler);
        let run = tokio::spawn(async move { server.run(server_read, server_write).await });

        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();
        run.await.unwrap().unwrap();

        // EOF arrives once every writer clone (including ones held by
        // spawned tool tasks) has dropped.
        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        out.lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    const INIT: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"c","version":"1"}}}"#;
    const INITIALIZED: &str = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

    #[tokio::test]
    async fn test_happy_handshake_and_list() {
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);

        assert_eq!(
            out[0],
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {"tools": {}, "logging": {}},
                    "serverInfo": {"name": "bossman", "version": "0.1.0"}
                }
            })
        );

        assert_eq!(out[1]["id"], 2);
        let tools = out[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
    }

    #[tokio::test]
    async fn test_ping_in_every_state() {
        // Before initialize
        let out = session("{\"jsonrpc\":\"2.0\",\"id\":\"p\",\"method\":\"ping\"}\n").await;
        assert_eq!(out, vec![json!({"jsonrpc":"2.0","id":"p","result":{}})]);

        // Initializing and Operating
        let input = format!(
            "{INIT}\n{}\n{INITIALIZED}\n{}\n",
            r#"{"jsonrpc":"2.0","id":"q","method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":"r","method":"ping"}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[1]["id"], "q");
        assert_eq!(out[1]["result"], json!({}));
        assert_eq!(out[2]["id"], "r");
    }

    #[tokio::test]
    async fn test_duplicate_initialize_rejected() {
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n",
            r#"{"jsonrpc":"2.0","id":9,"method":"initialize","params":{}}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[1]["id"], 9);
        assert_eq!(out[1]["error"]["code"], -32600);
        assert_eq!(out[1]["error"]["message"], "already initialized");
    }

    #[tokio::test]
    async fn test_requests_before_operating_are_refused() {
        // tools/list in Created
        let out = session("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n").await;
        assert_eq!(out[0]["error"]["code"], -32600);
        assert_eq!(out[0]["error"]["message"], "server not initialized");

        // tools/call in Initializing (no notifications/initialized yet);
        // the refusal must not disturb the lifecycle, so a later
        // initialized + list still succeeds.
        let input = format!(
            "{INIT}\n{}\n{INITIALIZED}\n{}\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[1]["error"]["code"], -32600);
        assert!(out[2]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let out =
            session("{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"resources/list\"}\n").await;
        assert_eq!(out[0]["error"]["code"], -32601);
        assert_eq!(out[0]["error"]["message"], "method not found: resources/list");
    }

    #[tokio::test]
    async fn test_tool_failure_is_an_execution_error() {
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n",
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"fail","arguments":{}}}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[1],
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "result": {
                    "content": [{"type": "text", "text": "boom"}],
                    "isError": true
                }
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_tool_call_params() {
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n",
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"arguments":{}}}"#
        );
        let out = session(&input).await;
        assert_eq!(out[1]["id"], 6);
        assert_eq!(out[1]["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_cancelled_call_is_silent() {
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n{}\n{}\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"block","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":7}}"#,
            r#"{"jsonrpc":"2.0","id":8,"method":"ping"}"#
        );
        let out = session(&input).await;
        // init, ping — and nothing for id 7
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v["id"] != 7));
    }

    #[tokio::test]
    async fn test_batched_call_cancelled_by_later_line() {
        // A 1-element array is still a batch on the wire. The blocked
        // tool inside it must not stall the reader: the cancellation
        // on the next line has to get through, and the batch (its only
        // member cancelled) then produces zero bytes.
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n{}\n{}\n",
            r#"[{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"block","arguments":{}}}]"#,
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":7}}"#,
            r#"{"jsonrpc":"2.0","id":8,"method":"ping"}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v["id"] != 7));
        assert!(out.iter().any(|v| v["id"] == 8));
    }

    #[tokio::test]
    async fn test_cancel_inside_same_batch() {
        // The cancellation sits after the call in the same array.
        // Routing registers the call first, so the cancellation wins
        // before the tool runs; the call stays silent.
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n{}\n",
            r#"[{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"block","arguments":{}}},{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":9}}]"#,
            r#"{"jsonrpc":"2.0","id":10,"method":"ping"}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v["id"] != 9));
        assert!(out.iter().any(|v| v["id"] == 10));
    }

    #[tokio::test]
    async fn test_batched_tool_calls_answer_in_one_frame() {
        let input = format!(
            "{INIT}\n{INITIALIZED}\n{}\n",
            r#"[{"jsonrpc":"2.0","id":11,"method":"tools/call","params":{"name":"echo","arguments":{"k":1}}},{"jsonrpc":"2.0","id":12,"method":"ping"}]"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);

        let batch = out[1].as_array().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0]["id"], 11);
        assert_eq!(batch[0]["result"]["isError"], false);
        assert_eq!(batch[1]["id"], 12);
    }

    #[tokio::test]
    async fn test_cancel_for_unknown_id_is_ignored() {
        let input = format!(
            "{INIT}\n{}\n{}\n",
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":99}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"bogus":true}}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 1); // only the initialize response
    }

    #[tokio::test]
    async fn test_mixed_batch_single_frame() {
        let input = format!(
            "{INIT}\n{}\n",
            r#"[{"jsonrpc":"2.0","id":1,"method":"ping"},{"jsonrpc":"2.0","method":"notifications/initialized"},{"jsonrpc":"2.0","id":2,"method":"tools/list"}]"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);

        let batch = out[1].as_array().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0]["id"], 1);
        assert_eq!(batch[0]["result"], json!({}));
        // initialized took effect before tools/list was dispatched
        assert_eq!(batch[1]["id"], 2);
        assert!(batch[1]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_notification_only_batch_is_silent() {
        let input = format!(
            "{INIT}\n{}\n{}\n",
            r#"[{"jsonrpc":"2.0","method":"notifications/initialized"},{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}]"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#
        );
        let out = session(&input).await;
        // initialize response, then the tools/list response: the batch
        // contributed zero bytes, but its initialized notification ran.
        assert_eq!(out.len(), 2);
        assert!(out[1]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_parse_error_then_recovery() {
        let input = format!(
            "{}\n{}\n",
            "this is not json",
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 2);
        assert!(out[0]["id"].is_null());
        assert_eq!(out[0]["error"]["code"], -32700);
        assert_eq!(out[1]["id"], 1);
    }

    #[tokio::test]
    async fn test_identifier_types_preserved() {
        let input = format!(
            "{}\n{}\n",
            r#"{"jsonrpc":"2.0","id":"1","method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#
        );
        let out = session(&input).await;
        assert_eq!(out[0]["id"], json!("1"));
        assert_eq!(out[1]["id"], json!(1));
    }

    #[tokio::test]
    async fn test_explicit_null_id_rejected() {
        let out = session("{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"ping\"}\n").await;
        assert_eq!(out.len(), 1);
        assert!(out[0]["id"].is_null());
        assert_eq!(out[0]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        // As a request: invalid-request. As a notification: dropped.
        let input = format!(
            "{}\n{}\n",
            r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
            r#"{"jsonrpc":"1.0","method":"notifications/initialized"}"#
        );
        let out = session(&input).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_unknown_notification_is_silent() {
        let out = session("{\"jsonrpc\":\"2.0\",\"method\":\"notifications/whatever\"}\n").await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_state_on_eof() {
        let server = McpServer::new(TestHandler);
        assert_eq!(server.state(), ServerState::Created);

        let runner = server.clone();
        let output: Vec<u8> = Vec::new();
        runner.run(&b""[..], output).await.unwrap();
        assert_eq!(server.state(), ServerState::Shutdown);
    }
}
