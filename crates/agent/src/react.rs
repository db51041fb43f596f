//! ReAct orchestrator — Thought → Action → Observation until a final answer.
//!
//! Each iteration builds the prompt from the transcript so far, asks the
//! model for one completion, parses it and, if it names an action, runs
//! that action and records the observation. The loop ends in exactly one
//! of the [`RunOutcome`] states and always yields a [`RunResult`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use thoughtline_config::AppConfig;
use thoughtline_core::event::{DomainEvent, EventBus};
use thoughtline_core::provider::{Provider, ProviderRequest};
use thoughtline_core::step::{RunOutcome, RunResult, Step};
use thoughtline_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

use crate::executor::StepExecutor;
use crate::parser::{ParsedResponse, parse_response};
use crate::prompt::PromptBuilder;

/// Final answer when an action payload cannot be decoded.
pub const PARSE_ERROR_ANSWER: &str = "Error: Failed to parse LLM response";
/// Final answer when the iteration budget runs out.
pub const MAX_ITERATIONS_ANSWER: &str = "Stopped after reaching maximum iterations limit.";
/// Final answer when no provider is configured.
pub const NO_MODEL_ANSWER: &str = "No LLM is connected. Configure a model provider and API key.";
/// Final answer when the model produced `Final Answer:` with nothing after it.
pub const EMPTY_FINAL_ANSWER: &str = "Final answer was empty.";

pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// The agent. Immutable once built; `run` can be called repeatedly.
pub struct ReactAgent {
    provider: Option<Arc<dyn Provider>>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: usize,
    registry: Arc<ToolRegistry>,
    prompt: PromptBuilder,
    executor: StepExecutor,
    event_bus: Option<Arc<EventBus>>,
}

impl ReactAgent {
    /// An agent over `registry` with no model connected.
    pub fn new(registry: ToolRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            provider: None,
            model: String::new(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            prompt: PromptBuilder::new(&registry),
            executor: StepExecutor::new(Arc::clone(&registry)),
            registry,
            event_bus: None,
        }
    }

    /// Build an agent with model and loop settings taken from `config`.
    pub fn from_config(
        config: &AppConfig,
        registry: ToolRegistry,
        provider: Option<Arc<dyn Provider>>,
    ) -> Self {
        let mut agent = Self::new(registry)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_iterations(config.agent.max_iterations as usize)
            .with_tool_timeout(config.agent.tool_timeout_secs.map(Duration::from_secs));
        if let Some(provider) = provider {
            agent = agent.with_provider(provider, thoughtline_providers::resolve_model(config));
        }
        agent
    }

    /// Connect a model.
    pub fn with_provider(mut self, provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        self.provider = Some(provider);
        self.model = model.into();
        self
    }

    /// Set max iterations. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    /// Pin the date shown in the system prompt.
    pub fn with_prompt_date(mut self, date: NaiveDate) -> Self {
        self.prompt = PromptBuilder::with_date(&self.registry, date);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    /// Answer `query`. Never fails; failures end the run with a sentinel
    /// final answer and the matching [`RunOutcome`].
    pub async fn run(&self, query: &str) -> RunResult {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut transcript: Vec<Step> = Vec::new();
        let mut iterations = 0usize;

        info!(
            run_id = %run_id,
            model = %self.model,
            max_iterations = self.max_iterations,
            tools = self.registry.len(),
            "ReAct run starting"
        );
        self.publish(DomainEvent::RunStarted {
            run_id: run_id.clone(),
            query_preview: query.chars().take(80).collect(),
            timestamp: Utc::now(),
        });

        while iterations < self.max_iterations {
            iterations += 1;
            debug!(run_id = %run_id, iteration = iterations, "ReAct iteration");

            let user_prompt = self.prompt.build(query, &transcript);
            if iterations == 1 {
                debug!(prompt = %user_prompt, "Initial prompt");
            }

            let Some(provider) = &self.provider else {
                warn!("No model provider configured");
                return self.finish(
                    &run_id,
                    transcript,
                    NO_MODEL_ANSWER.into(),
                    RunOutcome::NoModel,
                    iterations,
                );
            };

            let mut request =
                ProviderRequest::new(&self.model, self.prompt.system_prompt(), user_prompt);
            request.temperature = self.temperature;
            request.max_tokens = self.max_tokens;

            let response = match provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Model request failed");
                    return self.finish(
                        &run_id,
                        transcript,
                        format!("Error: LLM request failed: {e}"),
                        RunOutcome::ModelError,
                        iterations,
                    );
                }
            };
            self.publish(DomainEvent::ResponseGenerated {
                run_id: run_id.clone(),
                iteration: iterations,
                model: response.model.clone(),
                tokens_used: response.usage.map(|u| u.total_tokens),
                timestamp: Utc::now(),
            });
            debug!(completion = %response.content, "Model completion");

            match parse_response(&response.content) {
                Err(e) => {
                    warn!(
                        error = %e,
                        thought = ?e.salvaged.thought,
                        "Failed to parse model response"
                    );
                    return self.finish(
                        &run_id,
                        transcript,
                        PARSE_ERROR_ANSWER.into(),
                        RunOutcome::ParseError,
                        iterations,
                    );
                }
                Ok(ParsedResponse::FinalAnswer {
                    step,
                    answer,
                    action_ignored,
                }) => {
                    if action_ignored {
                        warn!("Completion had both an action and a final answer; action dropped");
                    }
                    transcript.push(step);
                    let answer = if answer.is_empty() {
                        EMPTY_FINAL_ANSWER.to_string()
                    } else {
                        answer
                    };
                    return self.finish(
                        &run_id,
                        transcript,
                        answer,
                        RunOutcome::FinalAnswer,
                        iterations,
                    );
                }
                Ok(ParsedResponse::Step(mut step)) => {
                    if let Some(action) = &step.action {
                        let start = Instant::now();
                        let execution = self.executor.dispatch(action).await;
                        self.publish(DomainEvent::ActionExecuted {
                            run_id: run_id.clone(),
                            action_type: action.action_type.clone(),
                            success: execution.success,
                            duration_ms: start.elapsed().as_millis() as u64,
                            timestamp: Utc::now(),
                        });
                        step.observation = Some(execution.observation);
                    }
                    transcript.push(step);
                }
            }
        }

        warn!(max_iterations = self.max_iterations, "ReAct: max iterations reached");
        self.finish(
            &run_id,
            transcript,
            MAX_ITERATIONS_ANSWER.into(),
            RunOutcome::MaxIterations,
            iterations,
        )
    }

    fn finish(
        &self,
        run_id: &str,
        transcript: Vec<Step>,
        final_answer: String,
        outcome: RunOutcome,
        iterations: usize,
    ) -> RunResult {
        info!(
            run_id,
            outcome = %outcome,
            iterations,
            steps = transcript.len(),
            "ReAct run finished"
        );
        self.publish(DomainEvent::RunFinished {
            run_id: run_id.to_string(),
            outcome,
            iterations,
            timestamp: Utc::now(),
        });
        RunResult {
            transcript,
            final_answer,
            outcome,
            iterations,
        }
    }
}
