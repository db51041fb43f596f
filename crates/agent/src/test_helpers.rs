//! Shared test helpers for agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thoughtline_core::error::{ProviderError, ToolError};
use thoughtline_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use thoughtline_core::tool::Tool;

/// A mock provider that returns a sequence of scripted completions.
///
/// Each call to `complete` returns the next entry in the queue.
/// Panics if more calls are made than entries provided.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Always answer with the same completion.
    pub fn repeating(text: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(text.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(ProviderResponse {
                content,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            }),
            Some(Err(e)) => Err(e),
            None => panic!(
                "ScriptedProvider: no more responses (call #{})",
                requests.len()
            ),
        }
    }
}

/// Returns a fixed output and records every input it receives.
pub struct StaticTool {
    action_type: String,
    output: String,
    inputs: Mutex<Vec<serde_json::Value>>,
}

impl StaticTool {
    pub fn new(action_type: &str, output: &str) -> Self {
        Self {
            action_type: action_type.into(),
            output: output.into(),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<serde_json::Value> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        "Static"
    }
    fn description(&self) -> &str {
        "Returns a canned answer"
    }
    fn action_type(&self) -> &str {
        &self.action_type
    }
    fn input_format(&self) -> &str {
        "Anything"
    }
    async fn run(&self, input: serde_json::Value) -> Result<String, ToolError> {
        self.inputs.lock().unwrap().push(input);
        Ok(self.output.clone())
    }
}

/// Always returns an error.
pub struct FailingTool {
    action_type: String,
}

impl FailingTool {
    pub fn new(action_type: &str) -> Self {
        Self {
            action_type: action_type.into(),
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "Failing"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn action_type(&self) -> &str {
        &self.action_type
    }
    fn input_format(&self) -> &str {
        "Anything"
    }
    async fn run(&self, _input: serde_json::Value) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.action_type.clone(),
            reason: "backend unavailable".into(),
        })
    }
}

/// Panics when run.
pub struct PanickingTool {
    action_type: String,
}

impl PanickingTool {
    pub fn new(action_type: &str) -> Self {
        Self {
            action_type: action_type.into(),
        }
    }
}

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "Panicking"
    }
    fn description(&self) -> &str {
        "Panics"
    }
    fn action_type(&self) -> &str {
        &self.action_type
    }
    fn input_format(&self) -> &str {
        "Anything"
    }
    async fn run(&self, _input: serde_json::Value) -> Result<String, ToolError> {
        panic!("tool exploded");
    }
}

/// Sleeps before answering "finally".
pub struct SlowTool {
    action_type: String,
    delay: Duration,
}

impl SlowTool {
    pub fn new(action_type: &str, delay: Duration) -> Self {
        Self {
            action_type: action_type.into(),
            delay,
        }
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "Slow"
    }
    fn description(&self) -> &str {
        "Takes its time"
    }
    fn action_type(&self) -> &str {
        &self.action_type
    }
    fn input_format(&self) -> &str {
        "Anything"
    }
    async fn run(&self, _input: serde_json::Value) -> Result<String, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok("finally".into())
    }
}
