//! Built-in tool implementations for thoughtline.
//!
//! Tools give the agent the ability to act: do math, search the web, query
//! the Ares live search API, ask the user a question, and call tools hosted
//! by MCP servers.

pub mod ares_search;
pub mod calculator;
pub mod mcp;
pub mod user_input;
pub mod web_search;

use std::sync::Arc;

use thoughtline_config::AppConfig;
use thoughtline_core::error::RegistryError;
use thoughtline_core::tool::{Tool, ToolRegistry};

pub use ares_search::AresSearchTool;
pub use calculator::CalculatorTool;
pub use mcp::{McpBridge, McpTool, ToolBridge};
pub use user_input::UserInputTool;
pub use web_search::WebSearchTool;

/// Every built-in tool, in prompt order.
pub fn builtin_tools(config: &AppConfig) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(WebSearchTool::new(config.tools.search_max_results)),
        Arc::new(CalculatorTool),
        Arc::new(UserInputTool::terminal()),
        Arc::new(AresSearchTool::from_config(&config.tools.ares)),
    ]
}

/// Build the registry for a run: enabled built-ins followed by `extra`
/// (typically MCP tools).
pub fn registry_from_config(
    config: &AppConfig,
    extra: Vec<Arc<dyn Tool>>,
) -> Result<ToolRegistry, RegistryError> {
    let enabled = builtin_tools(config)
        .into_iter()
        .filter(|t| config.tools.is_enabled(t.action_type()));
    ToolRegistry::from_tools(enabled.chain(extra))
}

/// Registry with every built-in tool and default settings.
pub fn default_registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::from_tools(builtin_tools(&AppConfig::default()))
}
