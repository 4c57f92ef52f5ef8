use super::error::ToolInvokeError;
use super::transport::{BoxedWriter, TransportChannels};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// One remotely invocable tool as published by `tools/list`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    json!({ "type": "object" })
}

#[derive(Debug, Deserialize)]
struct ToolListPage {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
    #[serde(rename = "nextCursor", default)]
    next_cursor: Option<String>,
}

type Responder = oneshot::Sender<Result<Value, ToolInvokeError>>;

/// A live JSON-RPC session with one MCP server.
///
/// Requests are written as single lines; a background task reads the other
/// half and routes responses back to the waiting request by id. Once
/// [`close`](Self::close) has run, every call fails with
/// [`ToolInvokeError::Closed`].
pub struct McpSession {
    server: String,
    writer: AsyncMutex<Option<BufWriter<BoxedWriter>>>,
    pending: AsyncMutex<HashMap<String, Responder>>,
    id_counter: AtomicU64,
    instructions: AsyncMutex<Option<String>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl McpSession {
    /// Takes ownership of the channels and starts routing inbound messages.
    pub fn start(server: impl Into<String>, channels: TransportChannels) -> Arc<Self> {
        let TransportChannels { reader, writer } = channels;
        let session = Arc::new(Self {
            server: server.into(),
            writer: AsyncMutex::new(Some(BufWriter::new(writer))),
            pending: AsyncMutex::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
            instructions: AsyncMutex::new(None),
            reader_task: Mutex::new(None),
            closed: AtomicBool::new(false),
        });

        let reader_self = Arc::clone(&session);
        let handle = tokio::spawn(async move {
            reader_self.reader_loop(reader).await;
        });
        if let Ok(mut task) = session.reader_task.lock() {
            *task = Some(handle);
        }
        session
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Performs the `initialize` handshake followed by `notifications/initialized`.
    pub async fn initialize(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "title": "Researcher MCP Client"
            },
            "capabilities": {}
        });
        let init_result = self.send_request("initialize", params).await?;
        if !init_result.is_object() {
            return Err(self.invalid_response("initialize", "result is not an object"));
        }
        if let Some(text) = init_result.get("instructions").and_then(Value::as_str) {
            let mut instructions = self.instructions.lock().await;
            *instructions = Some(text.to_string());
        }
        self.send_notification("notifications/initialized", json!({}))
            .await?;
        let protocol = init_result.get("protocolVersion").and_then(Value::as_str);
        debug!(server = %self.server, protocol, "MCP handshake completed");
        Ok(())
    }

    pub async fn instructions(&self) -> Option<String> {
        self.instructions.lock().await.clone()
    }

    /// Fetches every tool descriptor, following `nextCursor` pagination.
    ///
    /// A cursor the server already handed out ends the listing with
    /// [`ToolInvokeError::InvalidResponse`].
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.send_request("tools/list", params).await?;
            let page: ToolListPage = serde_json::from_value(result)
                .map_err(|err| self.invalid_response("tools/list", err.to_string()))?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if !seen_cursors.insert(next.clone()) {
                        return Err(self.invalid_response(
                            "tools/list",
                            format!("repeated cursor '{next}'"),
                        ));
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        debug!(server = %self.server, count = tools.len(), "listed MCP tools");
        Ok(tools)
    }

    /// Invokes a tool and returns the raw `result` object.
    pub async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        self.send_request("tools/call", params).await
    }

    /// Stops the reader, drops the writer and fails outstanding requests.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let handle = self.reader_task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = handle {
            handle.abort();
        }
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(err) = writer.shutdown().await {
                debug!(server = %self.server, %err, "failed to flush writer on close");
            }
        }
        self.fail_all_pending().await;
        debug!(server = %self.server, "MCP session closed");
    }

    async fn reader_loop(self: Arc<Self>, reader: impl AsyncRead + Unpin) {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let raw = match lines.next_line().await {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(err) => {
                    warn!(server = %self.server, %err, "failed to read from MCP server");
                    break;
                }
            };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('\u{1b}') {
                debug!(
                    server = %self.server,
                    line = trimmed,
                    "skipping non-JSON ANSI log line from MCP server"
                );
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => {
                    if let Err(err) = self.process_inbound_message(value).await {
                        warn!(
                            server = %self.server,
                            %err,
                            "failed to process message from MCP server"
                        );
                    }
                }
                Err(source) => {
                    warn!(
                        server = %self.server,
                        line = trimmed,
                        %source,
                        "received invalid JSON from MCP server"
                    );
                }
            }
        }

        if !self.is_closed() {
            debug!(server = %self.server, "MCP server closed its output stream");
        }
        self.writer.lock().await.take();
        self.fail_all_pending().await;
    }

    async fn process_inbound_message(&self, value: Value) -> Result<(), ToolInvokeError> {
        if let Some(id) = value.get("id").cloned() {
            if value.get("method").is_some() {
                self.handle_server_request(id, value).await
            } else {
                self.handle_response(id, value).await;
                Ok(())
            }
        } else {
            if let Some(method) = value.get("method").and_then(Value::as_str) {
                debug!(
                    server = %self.server,
                    method,
                    "received notification from server"
                );
            }
            Ok(())
        }
    }

    async fn handle_response(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };

        let responder = {
            let mut pending = self.pending.lock().await;
            pending.remove(&key)
        };

        let Some(sender) = responder else {
            debug!(
                server = %self.server,
                response_id = key,
                "received response for unknown request"
            );
            return;
        };

        let outcome = match value.get("error") {
            Some(Value::Object(error)) => Err(ToolInvokeError::Rpc {
                server: self.server.clone(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            }),
            Some(Value::Null) | None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
            Some(_) => Err(self.transport_error("malformed error payload in response")),
        };
        let _ = sender.send(outcome);
    }

    async fn handle_server_request(&self, id: Value, value: Value) -> Result<(), ToolInvokeError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if method == "ping" {
            return self.send_response(id, json!({})).await;
        }

        warn!(
            server = %self.server,
            method,
            "server sent unsupported request"
        );
        let error = json!({
            "code": -32601,
            "message": format!("client does not implement method '{method}'"),
        });
        self.send_error(id, error).await
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        if self.is_closed() {
            return Err(self.closed_error());
        }

        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        if let Err(err) = self.write_message(&payload).await {
            self.pending.lock().await.remove(&id);
            return Err(err);
        }

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.clone(),
            }),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.write_message(&payload).await
    }

    async fn send_response(&self, id: Value, result: Value) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result
        });
        self.write_message(&payload).await
    }

    async fn send_error(&self, id: Value, error: Value) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": error
        });
        self.write_message(&payload).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let mut encoded =
            serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.clone(),
                source,
            })?;
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(if self.is_closed() {
                self.closed_error()
            } else {
                ToolInvokeError::Terminated {
                    server: self.server.clone(),
                }
            });
        };
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        Ok(())
    }

    async fn fail_all_pending(&self) {
        let mut pending = self.pending.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(ToolInvokeError::Terminated {
                server: self.server.clone(),
            }));
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    fn closed_error(&self) -> ToolInvokeError {
        ToolInvokeError::Closed {
            server: self.server.clone(),
        }
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.clone(),
            message: message.into(),
        }
    }

    fn invalid_response(&self, method: &str, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::InvalidResponse {
            server: self.server.clone(),
            method: method.to_string(),
            message: message.into(),
        }
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}
