//! Step executor — dispatches one action to its tool.
//!
//! Every outcome becomes an [`Observation`]: unknown action types, tool
//! errors, timeouts and panics are all rendered as text for the model.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thoughtline_core::error::ToolError;
use thoughtline_core::step::{Action, Observation};
use thoughtline_core::tool::ToolRegistry;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct StepExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Option<Duration>,
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub observation: Observation,
    /// False when the observation describes a failure.
    pub success: bool,
}

impl StepExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bound each tool call. `None` lets tools run as long as they like.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute `action`, always producing an observation.
    pub async fn execute(&self, action: &Action) -> Observation {
        self.dispatch(action).await.observation
    }

    pub async fn dispatch(&self, action: &Action) -> Execution {
        let id = action.action_type.as_str();
        let Some(tool) = self.registry.get(id) else {
            warn!(action_type = id, "Unknown action type");
            return Execution {
                observation: Observation::new(format!("Error: Unknown action type '{id}'")),
                success: false,
            };
        };

        let call = AssertUnwindSafe(tool.run(action.input.clone())).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => flatten(result),
                Err(_) => Err(ToolError::Timeout {
                    tool_name: id.to_string(),
                    timeout_secs: limit.as_secs(),
                }),
            },
            None => flatten(call.await),
        };

        match outcome {
            Ok(output) => {
                debug!(action_type = id, bytes = output.len(), "Tool succeeded");
                Execution {
                    observation: Observation::new(output),
                    success: true,
                }
            }
            Err(e) => {
                warn!(action_type = id, error = %e, "Tool failed");
                Execution {
                    observation: Observation::new(format!("Error running tool '{id}': {e}")),
                    success: false,
                }
            }
        }
    }
}

fn flatten(
    result: Result<Result<String, ToolError>, Box<dyn Any + Send>>,
) -> Result<String, ToolError> {
    match result {
        Ok(inner) => inner,
        Err(payload) => Err(ToolError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
