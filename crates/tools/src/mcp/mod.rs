//! Model Context Protocol integration.
//!
//! [`McpBridge`] talks to MCP servers over stdio; [`McpTool`] exposes each
//! remote tool to the agent under the action type `mcp:<server>:<tool>`.

pub mod bridge;
pub mod tool;

pub use bridge::{McpBridge, RemoteTool, ToolBridge};
pub use tool::{McpTool, discover_tools};
