//! Run transcript types: actions, observations, steps and the final result.
//!
//! These are the value objects that flow through one agent run:
//! the parser produces an [`Action`], the executor answers with an
//! [`Observation`], and the orchestrator appends a [`Step`] per iteration
//! until it can hand back a [`RunResult`].

use serde::{Deserialize, Serialize};

/// A structured instruction extracted from model output.
///
/// Serialized on the transcript `Action:` line as
/// `{"action_identifier": ..., "input": ...}`. The legacy field name
/// `action_type` is accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Action {
    #[serde(rename = "action_identifier", alias = "action_type")]
    pub action_type: String,

    pub input: serde_json::Value,
}

impl Action {
    pub fn new(action_type: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            action_type: action_type.into(),
            input,
        }
    }

    /// Inline JSON form used in the transcript.
    pub fn to_inline_json(&self) -> String {
        // Serializing a String and a Value cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The textual result of executing one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub result: String,
}

impl Observation {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
        }
    }
}

/// One iteration's record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reflection: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
}

impl Step {
    /// True when no section was recognized in the model output.
    pub fn is_empty(&self) -> bool {
        self.thought.is_none()
            && self.pause_reflection.is_none()
            && self.action.is_none()
            && self.observation.is_none()
    }
}

/// How a run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The model produced a `Final Answer:`.
    FinalAnswer,
    /// The iteration budget ran out.
    MaxIterations,
    /// An `Action:` payload could not be decoded.
    ParseError,
    /// No model provider was configured.
    NoModel,
    /// The model provider returned an error.
    ModelError,
}

impl RunOutcome {
    /// Whether the run ended with a genuine answer from the model.
    pub fn is_success(self) -> bool {
        matches!(self, RunOutcome::FinalAnswer)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunOutcome::FinalAnswer => "final_answer",
            RunOutcome::MaxIterations => "max_iterations",
            RunOutcome::ParseError => "parse_error",
            RunOutcome::NoModel => "no_model",
            RunOutcome::ModelError => "model_error",
        };
        f.write_str(label)
    }
}

/// The terminal result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Every step appended during the run, in order.
    pub transcript: Vec<Step>,

    /// The model's answer, or a fixed sentinel message on failure paths.
    pub final_answer: String,

    pub outcome: RunOutcome,

    /// Number of iterations started (model calls attempted or skipped).
    pub iterations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_with_identifier_field() {
        let action = Action::new("calculate", serde_json::json!("2+2"));
        assert_eq!(
            action.to_inline_json(),
            r#"{"action_identifier":"calculate","input":"2+2"}"#
        );
    }

    #[test]
    fn action_accepts_legacy_field_name() {
        let action: Action =
            serde_json::from_str(r#"{"action_type": "search", "input": "rust"}"#).unwrap();
        assert_eq!(action.action_type, "search");
        assert_eq!(action.input, serde_json::json!("rust"));
    }

    #[test]
    fn action_rejects_extra_fields() {
        let result: Result<Action, _> = serde_json::from_str(
            r#"{"action_identifier": "search", "input": "rust", "extra": 1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn default_step_is_empty() {
        assert!(Step::default().is_empty());
        let step = Step {
            thought: Some("thinking".into()),
            ..Step::default()
        };
        assert!(!step.is_empty());
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(RunOutcome::MaxIterations.to_string(), "max_iterations");
        assert!(RunOutcome::FinalAnswer.is_success());
        assert!(!RunOutcome::ParseError.is_success());
    }
}
