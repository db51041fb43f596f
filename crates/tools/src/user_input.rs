//! User input tool — lets the model ask the human a follow-up question.
//!
//! The default responder prompts on the terminal; tests and embedders can
//! supply their own.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use thoughtline_core::error::ToolError;
use thoughtline_core::tool::Tool;

/// Produces the user's reply to a prompt. Called on a blocking thread.
pub type Responder = Arc<dyn Fn(&str) -> io::Result<String> + Send + Sync>;

pub struct UserInputTool {
    responder: Responder,
}

impl UserInputTool {
    /// Ask on the process terminal.
    pub fn terminal() -> Self {
        Self::with_responder(Arc::new(ask_terminal))
    }

    pub fn with_responder(responder: Responder) -> Self {
        Self { responder }
    }
}

fn ask_terminal(prompt: &str) -> io::Result<String> {
    {
        let mut stdout = io::stdout().lock();
        write!(stdout, "\nAI assistant: {prompt}\nUser response: ")?;
        stdout.flush()?;
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[async_trait]
impl Tool for UserInputTool {
    fn name(&self) -> &str {
        "User Input Requester"
    }

    fn description(&self) -> &str {
        "Requests more information from the user to continue solving the task."
    }

    fn action_type(&self) -> &str {
        "request_user_input"
    }

    fn input_format(&self) -> &str {
        "A string that defines the prompt/question to ask the user. Example: 'Please provide more details about your project goals.'"
    }

    async fn run(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let Some(prompt) = input.as_str() else {
            return Ok("Error: Expected a prompt string to request user input.".into());
        };

        let responder = Arc::clone(&self.responder);
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || responder(&prompt))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "request_user_input".into(),
                reason: e.to_string(),
            })?;

        answer.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "request_user_input".into(),
            reason: format!("failed to read user response: {e}"),
        })
    }
}
