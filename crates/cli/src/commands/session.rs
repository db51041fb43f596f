//! Shared setup for commands that run the agent.
//!
//! Loads config, connects to MCP servers, builds the tool registry and
//! provider, and renders run results for the terminal.

use std::sync::Arc;

use thoughtline_agent::{ReactAgent, format_history};
use thoughtline_config::AppConfig;
use thoughtline_core::step::{RunOutcome, RunResult};
use thoughtline_core::tool::{Tool, ToolRegistry};
use thoughtline_tools::mcp::{McpBridge, ToolBridge, discover_tools};

pub struct Session {
    pub config: AppConfig,
    pub agent: ReactAgent,
    bridge: Option<Arc<McpBridge>>,
}

impl Session {
    /// Load config from disk and build a ready-to-run agent.
    pub async fn open(max_iterations: Option<usize>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
        Self::from_config(config, max_iterations).await
    }

    pub async fn from_config(
        config: AppConfig,
        max_iterations: Option<usize>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (registry, bridge) = build_registry(&config).await?;

        let router = thoughtline_providers::build_from_config(&config);
        let provider = router.default();
        if provider.is_none() {
            print_missing_key_help(&config);
        }

        let mut agent = ReactAgent::from_config(&config, registry, provider);
        if let Some(max) = max_iterations {
            agent = agent.with_max_iterations(max);
        }

        Ok(Self {
            config,
            agent,
            bridge,
        })
    }

    /// Stop any MCP servers this session started.
    pub async fn close(self) {
        if let Some(bridge) = self.bridge {
            bridge.stop().await;
        }
    }
}

/// Enabled built-in tools plus whatever the configured MCP servers expose.
///
/// MCP failures are logged and skipped; the agent still runs with the
/// built-ins.
pub async fn build_registry(
    config: &AppConfig,
) -> Result<(ToolRegistry, Option<Arc<McpBridge>>), Box<dyn std::error::Error>> {
    let mut extra: Vec<Arc<dyn Tool>> = Vec::new();
    let mut bridge = None;

    let mcp = Arc::new(McpBridge::new(config.mcp_servers.clone()));
    if !mcp.is_empty() {
        match connect_mcp(Arc::clone(&mcp)).await {
            Ok(tools) => {
                tracing::info!(count = tools.len(), "Discovered MCP tools");
                extra = tools;
                bridge = Some(mcp);
            }
            Err(e) => {
                tracing::warn!(error = %e, "MCP servers unavailable, continuing without them");
                mcp.stop().await;
            }
        }
    }

    let registry = thoughtline_tools::registry_from_config(config, extra)?;
    Ok((registry, bridge))
}

async fn connect_mcp(
    bridge: Arc<McpBridge>,
) -> Result<Vec<Arc<dyn Tool>>, thoughtline_core::error::ToolError> {
    bridge.start().await?;
    discover_tools(bridge).await
}

fn print_missing_key_help(config: &AppConfig) {
    eprintln!();
    eprintln!("  WARNING: No API key configured for '{}'.", config.default_provider);
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   (recommended)");
    eprintln!("    OPENAI_API_KEY=sk-...             (for OpenAI direct)");
    eprintln!("    THOUGHTLINE_API_KEY=sk-...        (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}

/// Render a run for the terminal: optional step log, then the answer.
pub fn render_result(result: &RunResult, show_steps: bool) -> String {
    let mut out = String::new();
    if show_steps {
        for (i, step) in result.transcript.iter().enumerate() {
            out.push_str(&format!("── Step {} ──\n", i + 1));
            out.push_str(&format_history(std::slice::from_ref(step)));
        }
        out.push('\n');
    }

    let label = match result.outcome {
        RunOutcome::FinalAnswer => "Final Answer",
        _ => "Stopped",
    };
    out.push_str(&format!("{label}: {}\n", result.final_answer));
    if show_steps {
        out.push_str(&format!(
            "({} iteration(s), outcome: {})\n",
            result.iterations, result.outcome
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use thoughtline_core::step::{Action, Observation, Step};

    fn sample() -> RunResult {
        RunResult {
            transcript: vec![
                Step {
                    thought: Some("compute".into()),
                    action: Some(Action::new("calculate", serde_json::json!("2+2"))),
                    observation: Some(Observation::new("4")),
                    ..Step::default()
                },
                Step {
                    thought: Some("I now know the final answer".into()),
                    ..Step::default()
                },
            ],
            final_answer: "4".into(),
            outcome: RunOutcome::FinalAnswer,
            iterations: 2,
        }
    }

    #[test]
    fn answer_only_by_default() {
        assert_eq!(render_result(&sample(), false), "Final Answer: 4\n");
    }

    #[test]
    fn steps_are_numbered() {
        let out = render_result(&sample(), true);
        assert!(out.starts_with("── Step 1 ──\nThought: compute\n"));
        assert!(out.contains("Observation: 4\n── Step 2 ──\n"));
        assert!(out.contains("(2 iteration(s), outcome: final_answer)"));
    }

    #[test]
    fn failed_runs_are_labelled() {
        let mut result = sample();
        result.outcome = RunOutcome::MaxIterations;
        result.final_answer = "Stopped after reaching maximum iterations limit.".into();
        assert!(render_result(&result, false).starts_with("Stopped: "));
    }

    #[tokio::test]
    async fn registry_without_mcp_has_builtins() {
        let (registry, bridge) = build_registry(&AppConfig::default()).await.unwrap();
        assert!(bridge.is_none());
        assert!(registry.get("calculate").is_some());
        assert!(registry.get("search").is_some());
    }
}
