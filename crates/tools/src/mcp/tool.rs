//! Adapter from a remote MCP tool to the local [`Tool`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thoughtline_core::error::ToolError;
use thoughtline_core::tool::Tool;

use super::bridge::{RemoteTool, ToolBridge};

pub struct McpTool {
    server_id: String,
    tool_name: String,
    name: String,
    description: String,
    action_type: String,
    input_format: String,
    bridge: Arc<dyn ToolBridge>,
}

impl McpTool {
    pub fn new(server_id: &str, remote: &RemoteTool, bridge: Arc<dyn ToolBridge>) -> Self {
        let description = if remote.description.trim().is_empty() {
            format!("Remote tool '{}' served by MCP server '{}'.", remote.name, server_id)
        } else {
            remote.description.trim().to_string()
        };

        Self {
            server_id: server_id.to_string(),
            tool_name: remote.name.clone(),
            name: format!("{} (MCP:{})", remote.name, server_id),
            description,
            action_type: format!("mcp:{}:{}", server_id, remote.name),
            input_format: input_format_for(&remote.input_schema),
            bridge,
        }
    }
}

fn input_format_for(schema: &Value) -> String {
    let has_properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty());
    if has_properties {
        format!("A JSON object of arguments matching this schema: {schema}")
    } else {
        "A JSON object of arguments. Any other value is sent as {\"input\": <value>}.".into()
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn action_type(&self) -> &str {
        &self.action_type
    }

    fn input_format(&self) -> &str {
        &self.input_format
    }

    async fn run(&self, input: Value) -> Result<String, ToolError> {
        let arguments = match input {
            Value::Object(_) => input,
            other => serde_json::json!({ "input": other }),
        };

        match self
            .bridge
            .call_tool(&self.server_id, &self.tool_name, arguments)
            .await
        {
            Ok(output) => Ok(output),
            Err(e) => Ok(format!("Error calling MCP tool '{}': {e}", self.tool_name)),
        }
    }
}

/// Wrap every tool the bridge advertises.
pub async fn discover_tools(bridge: Arc<dyn ToolBridge>) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    let listing = bridge.list_tools().await?;
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
    for (server_id, remote_tools) in &listing {
        for remote in remote_tools {
            tools.push(Arc::new(McpTool::new(server_id, remote, Arc::clone(&bridge))));
        }
    }
    Ok(tools)
}
