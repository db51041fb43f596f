//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world: search
//! the web, do math, ask the user, call a remote MCP server. Each tool is
//! addressed by its *action type*, the identifier the model writes in its
//! `Action:` line.
//!
//! A tool's `run` may have arbitrary side effects (network calls, terminal
//! prompts, child processes). The agent does not sandbox tools; it only
//! guarantees that a failing or panicking tool cannot abort a run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RegistryError, ToolError};

/// Static description of a tool, rendered into the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Human-readable name (e.g., "Calculator")
    pub name: String,

    /// What the tool does
    pub description: String,

    /// The registry key the model uses to invoke the tool
    pub action_type: String,

    /// A hint describing the expected `input` value
    pub input_format: String,
}

impl ToolDescriptor {
    /// Render the descriptive block used in the system prompt.
    pub fn render(&self) -> String {
        format!(
            "Tool: {}\nDescription: {}\nAction Type: {}\nInput Format: {}\n",
            self.name, self.description, self.action_type, self.input_format
        )
    }
}

/// The core Tool trait.
///
/// Implementations should convert their own failures into a descriptive
/// `Ok` string where that reads naturally to the model ("No results
/// found."); anything returned as `Err` is rendered by the step executor as
/// `Error running tool '<action_type>': <error>`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Human-readable name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// The unique identifier used in `Action:` payloads.
    fn action_type(&self) -> &str;

    /// Describes the shape of `input` the tool expects.
    fn input_format(&self) -> &str;

    /// Run the tool with the action's input value.
    async fn run(&self, input: serde_json::Value) -> Result<String, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            action_type: self.action_type().to_string(),
            input_format: self.input_format().to_string(),
        }
    }
}

/// A registry of available tools, keyed by action type.
///
/// Built once and handed to the agent; registration order is preserved so
/// the system prompt is stable across runs.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools, rejecting duplicate action types.
    pub fn from_tools<I>(tools: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool. A second tool claiming an existing action type is
    /// rejected rather than shadowing the first.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let action_type = tool.action_type().to_string();
        if action_type.trim().is_empty() {
            return Err(RegistryError::EmptyActionType(tool.name().to_string()));
        }
        // The id is advertised verbatim in the prompt and looked up verbatim.
        if action_type.trim() != action_type {
            return Err(RegistryError::UntrimmedActionType {
                action_type,
                tool: tool.name().to_string(),
            });
        }
        if let Some(&existing) = self.index.get(&action_type) {
            return Err(RegistryError::DuplicateActionType {
                action_type,
                existing: self.tools[existing].name().to_string(),
                rejected: tool.name().to_string(),
            });
        }
        tracing::debug!(action_type = %action_type, tool = tool.name(), "Registered tool");
        self.index.insert(action_type, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by action type.
    pub fn get(&self, action_type: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(action_type).map(|&i| &self.tools[i])
    }

    /// Descriptors of all tools, in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// All registered action types, in registration order.
    pub fn action_types(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.action_type()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("action_types", &self.action_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool {
        action_type: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "Echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn action_type(&self) -> &str {
            self.action_type
        }
        fn input_format(&self) -> &str {
            "Any string"
        }
        async fn run(&self, input: serde_json::Value) -> Result<String, ToolError> {
            Ok(input.as_str().unwrap_or_default().to_string())
        }
    }

    fn echo(action_type: &'static str) -> Arc<dyn Tool> {
        Arc::new(EchoTool { action_type })
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = ToolRegistry::from_tools([echo("echo")]).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_rejects_duplicate_action_types() {
        let err = ToolRegistry::from_tools([echo("echo"), echo("echo")]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateActionType { ref action_type, .. } if action_type == "echo"
        ));
    }

    #[test]
    fn registry_rejects_blank_action_type() {
        let mut registry = ToolRegistry::new();
        let err = registry.register(echo("  ")).unwrap_err();
        assert_eq!(err, RegistryError::EmptyActionType("Echo".into()));
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_rejects_padded_action_type() {
        let mut registry = ToolRegistry::new();
        let err = registry.register(echo(" search ")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UntrimmedActionType {
                action_type: " search ".into(),
                tool: "Echo".into(),
            }
        );
        assert!(registry.get("search").is_none());
        assert!(registry.action_types().is_empty());
    }

    #[test]
    fn registry_preserves_registration_order() {
        let registry =
            ToolRegistry::from_tools([echo("zeta"), echo("alpha"), echo("mid")]).unwrap();
        assert_eq!(registry.action_types(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn descriptor_renders_prompt_block() {
        let block = echo("echo").descriptor().render();
        assert_eq!(
            block,
            "Tool: Echo\nDescription: Echoes back the input\nAction Type: echo\nInput Format: Any string\n"
        );
    }

    #[tokio::test]
    async fn registry_runs_tool() {
        let registry = ToolRegistry::from_tools([echo("echo")]).unwrap();
        let tool = registry.get("echo").unwrap();
        let output = tool.run(serde_json::json!("hello world")).await.unwrap();
        assert_eq!(output, "hello world");
    }
}
