//! Stdio JSON-RPC client for MCP servers.
//!
//! Each configured server is spawned as a child process and spoken to with
//! newline-delimited JSON-RPC 2.0 messages. Requests on one bridge are
//! serialized behind a single lock; the agent never issues two at once.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thoughtline_config::McpServerConfig;
use thoughtline_core::error::ToolError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// A tool advertised by a remote server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, rename = "inputSchema", alias = "input_schema")]
    pub input_schema: Value,
}

/// Access to tools hosted outside the process.
#[async_trait]
pub trait ToolBridge: Send + Sync {
    /// Connect to every configured server.
    async fn start(&self) -> Result<(), ToolError>;

    /// Disconnect from every server. Safe to call more than once.
    async fn stop(&self);

    /// Tools per server id.
    async fn list_tools(&self) -> Result<BTreeMap<String, Vec<RemoteTool>>, ToolError>;

    /// Invoke one remote tool and coalesce its output to text.
    async fn call_tool(
        &self,
        server_id: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Result<String, ToolError>;
}

/// A running server process.
struct StdioProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Drop for StdioProcess {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

impl StdioProcess {
    async fn spawn(config: &McpServerConfig) -> Result<Self, ToolError> {
        let mut command = Command::new(&config.command);
        if !config.args.is_empty() {
            command.args(&config.args);
        }
        if !config.env.is_empty() {
            command.envs(&config.env);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            ToolError::Bridge(format!(
                "spawning MCP server '{}' ({}): {e}",
                config.id, config.command
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Bridge("failed to capture stdin for MCP server".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Bridge("failed to capture stdout for MCP server".into()))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    async fn send(&mut self, body: &Value) -> Result<(), ToolError> {
        let mut payload = serde_json::to_vec(body)
            .map_err(|e| ToolError::Bridge(format!("encoding MCP message: {e}")))?;
        payload.push(b'\n');
        self.stdin
            .write_all(&payload)
            .await
            .map_err(|e| ToolError::Bridge(format!("writing to MCP server: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ToolError::Bridge(format!("flushing MCP stdin: {e}")))
    }

    async fn read_message(&mut self, timeout_dur: Duration) -> Result<Value, ToolError> {
        loop {
            let mut line = String::new();
            let read = timeout(timeout_dur, self.stdout.read_line(&mut line))
                .await
                .map_err(|_| ToolError::Bridge("timed out waiting for MCP server".into()))?
                .map_err(|e| ToolError::Bridge(format!("reading from MCP server: {e}")))?;
            if read == 0 {
                return Err(ToolError::Bridge("MCP server closed stdout".into()));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str(trimmed) {
                Ok(value) => return Ok(value),
                Err(_) => debug!(line = %trimmed, "Ignoring non-JSON output from MCP server"),
            }
        }
    }
}

/// MCP client over stdio for a set of configured servers.
pub struct McpBridge {
    servers: Vec<McpServerConfig>,
    request_timeout: Duration,
    request_id: AtomicU64,
    sessions: Mutex<BTreeMap<String, StdioProcess>>,
}

impl McpBridge {
    pub fn new(servers: Vec<McpServerConfig>) -> Self {
        Self {
            servers: servers.into_iter().filter(|s| s.enabled).collect(),
            request_timeout: Duration::from_secs(60),
            request_id: AtomicU64::new(1),
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    async fn request(
        &self,
        process: &mut StdioProcess,
        server_id: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, ToolError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        process.send(&body).await?;

        loop {
            let payload = process.read_message(self.request_timeout).await?;
            if matches_request(&payload, id) {
                return extract_result(payload, server_id);
            }
            if let Some(method) = payload.get("method").and_then(|m| m.as_str()) {
                debug!(server = server_id, method, "MCP notification");
            }
        }
    }

    async fn notify(process: &mut StdioProcess, method: &str) -> Result<(), ToolError> {
        process
            .send(&json!({ "jsonrpc": "2.0", "method": method }))
            .await
    }

    async fn connect(&self, config: &McpServerConfig) -> Result<StdioProcess, ToolError> {
        let mut process = StdioProcess::spawn(config).await?;
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "thoughtline",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        self.request(&mut process, &config.id, "initialize", params)
            .await?;
        Self::notify(&mut process, "notifications/initialized").await?;
        Ok(process)
    }

    async fn list_server_tools(
        &self,
        process: &mut StdioProcess,
        server_id: &str,
    ) -> Result<Vec<RemoteTool>, ToolError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = self
                .request(process, server_id, "tools/list", params)
                .await?;
            let page: ToolListResponse = serde_json::from_value(result).map_err(|e| {
                ToolError::Bridge(format!("decoding tool list from '{server_id}': {e}"))
            })?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(tools)
    }
}

#[async_trait]
impl ToolBridge for McpBridge {
    async fn start(&self) -> Result<(), ToolError> {
        let mut sessions = self.sessions.lock().await;
        for config in &self.servers {
            if sessions.contains_key(&config.id) {
                continue;
            }
            let process = self.connect(config).await?;
            info!(server = %config.id, command = %config.command, "MCP server connected");
            sessions.insert(config.id.clone(), process);
        }
        Ok(())
    }

    async fn stop(&self) {
        let mut sessions = self.sessions.lock().await;
        for (id, mut process) in std::mem::take(&mut *sessions) {
            if let Err(e) = process.child.kill().await {
                debug!(server = %id, error = %e, "MCP server already exited");
            }
        }
    }

    async fn list_tools(&self) -> Result<BTreeMap<String, Vec<RemoteTool>>, ToolError> {
        let mut sessions = self.sessions.lock().await;
        let mut out = BTreeMap::new();
        for (id, process) in sessions.iter_mut() {
            let tools = self.list_server_tools(process, id).await?;
            debug!(server = %id, count = tools.len(), "Listed MCP tools");
            out.insert(id.clone(), tools);
        }
        Ok(out)
    }

    async fn call_tool(
        &self,
        server_id: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Result<String, ToolError> {
        let mut sessions = self.sessions.lock().await;
        let process = sessions
            .get_mut(server_id)
            .ok_or_else(|| ToolError::Bridge(format!("MCP server not connected: {server_id}")))?;

        let params = json!({ "name": tool_name, "arguments": arguments });
        let result = match self.request(process, server_id, "tools/call", params).await {
            Ok(result) => result,
            Err(e) => {
                // A broken pipe or timeout leaves the stream unusable.
                if !matches!(e, ToolError::Remote { .. }) {
                    warn!(server = server_id, error = %e, "Dropping MCP session");
                    sessions.remove(server_id);
                }
                return Err(e);
            }
        };

        let text = collect_text(&result);
        if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            return Err(ToolError::Bridge(text));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ToolListResponse {
    #[serde(default)]
    tools: Vec<RemoteTool>,
    #[serde(default, rename = "nextCursor")]
    next_cursor: Option<String>,
}

fn matches_request(payload: &Value, request_id: u64) -> bool {
    match payload.get("id") {
        Some(Value::Number(num)) => num.as_u64() == Some(request_id),
        Some(Value::String(text)) => text.parse::<u64>().is_ok_and(|id| id == request_id),
        _ => false,
    }
}

fn extract_result(payload: Value, server_id: &str) -> Result<Value, ToolError> {
    if let Some(error) = payload.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ToolError::Remote {
            server: server_id.to_string(),
            message,
        });
    }

    match payload {
        Value::Object(mut map) => Ok(map.remove("result").unwrap_or(Value::Object(map))),
        other => Ok(other),
    }
}

/// Join the text parts of a `tools/call` result, falling back to raw JSON.
fn collect_text(result: &Value) -> String {
    let parts: Vec<String> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("text")
                        .or_else(|| item.get("value"))
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                })
                .collect()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        result.to_string()
    } else {
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn request_id_matching() {
        assert!(matches_request(&json!({"id": 7}), 7));
        assert!(matches_request(&json!({"id": "7"}), 7));
        assert!(!matches_request(&json!({"id": 8}), 7));
        assert!(!matches_request(&json!({"method": "notifications/progress"}), 7));
    }

    #[test]
    fn extract_result_and_error() {
        let ok = extract_result(json!({"id": 1, "result": {"tools": []}}), "math").unwrap();
        assert_eq!(ok, json!({"tools": []}));

        let err = extract_result(
            json!({"id": 1, "error": {"code": -32601, "message": "Method not found"}}),
            "math",
        )
        .unwrap_err();
        assert!(matches!(
            &err,
            ToolError::Remote { server, message } if server == "math" && message == "Method not found"
        ));
    }

    #[test]
    fn text_parts_are_joined() {
        let result = json!({"content": [
            {"type": "text", "text": "line one"},
            {"type": "image", "data": "..."},
            {"type": "text", "text": "line two"}
        ]});
        assert_eq!(collect_text(&result), "line one\nline two");
    }

    #[test]
    fn non_text_result_falls_back_to_json() {
        let result = json!({"structured": {"sum": 5}});
        assert_eq!(collect_text(&result), r#"{"structured":{"sum":5}}"#);
    }

    #[test]
    fn remote_tool_accepts_camel_case_schema() {
        let tool: RemoteTool = serde_json::from_value(json!({
            "name": "add",
            "inputSchema": {"type": "object"}
        }))
        .unwrap();
        assert_eq!(tool.description, "");
        assert_eq!(tool.input_schema, json!({"type": "object"}));
    }

    #[test]
    fn disabled_servers_are_skipped() {
        let bridge = McpBridge::new(vec![McpServerConfig {
            id: "off".into(),
            command: "true".into(),
            args: vec![],
            env: HashMap::new(),
            enabled: false,
        }]);
        assert!(bridge.is_empty());
    }

    #[tokio::test]
    async fn call_on_unknown_server_fails() {
        let bridge = McpBridge::new(vec![]);
        let err = bridge
            .call_tool("missing", "add", json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let bridge = McpBridge::new(vec![McpServerConfig {
            id: "ghost".into(),
            command: "/nonexistent/thoughtline-mcp-server".into(),
            args: vec![],
            env: HashMap::new(),
            enabled: true,
        }]);
        let err = bridge.start().await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdio_round_trip_with_scripted_server() {
        // Replies to initialize, skips the initialized notification, then
        // answers tools/list and tools/call in order.
        let script = r#"
read line
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{}}}'
read line
read line
echo '{"jsonrpc":"2.0","method":"notifications/message","params":{}}'
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"add","description":"Add two numbers","inputSchema":{"type":"object"}}]}}'
read line
echo '{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"5"}]}}'
"#;
        let bridge = McpBridge::new(vec![McpServerConfig {
            id: "math".into(),
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            env: HashMap::new(),
            enabled: true,
        }])
        .with_request_timeout(Duration::from_secs(10));

        bridge.start().await.unwrap();

        let tools = bridge.list_tools().await.unwrap();
        assert_eq!(tools["math"].len(), 1);
        assert_eq!(tools["math"][0].name, "add");

        let out = bridge
            .call_tool("math", "add", json!({"a": 2, "b": 3}))
            .await
            .unwrap();
        assert_eq!(out, "5");

        bridge.stop().await;
        assert!(bridge.call_tool("math", "add", json!({})).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn remote_error_keeps_session() {
        let script = r#"
read line
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{}}}'
read line
read line
echo '{"jsonrpc":"2.0","id":2,"error":{"code":-32602,"message":"Unknown tool: nope"}}'
read line
echo '{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"still here"}]}}'
"#;
        let bridge = McpBridge::new(vec![McpServerConfig {
            id: "math".into(),
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            env: HashMap::new(),
            enabled: true,
        }])
        .with_request_timeout(Duration::from_secs(10));
        bridge.start().await.unwrap();

        let err = bridge.call_tool("math", "nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Remote { .. }));

        let out = bridge.call_tool("math", "add", json!({})).await.unwrap();
        assert_eq!(out, "still here");
        bridge.stop().await;
    }
}
