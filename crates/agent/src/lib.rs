//! The ReAct loop — the heart of thoughtline.
//!
//! The agent follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Build the prompt** (system instructions + question + history)
//! 2. **Send to the LLM** via the configured provider
//! 3. **Parse** the completion into a step
//! 4. **If an action**: run the tool, record the observation, loop back to 1
//! 5. **If a final answer**: return it with the full transcript
//!
//! The loop also stops on a malformed action, a provider failure, or when
//! the max iteration limit is reached.

pub mod executor;
pub mod parser;
pub mod prompt;
pub mod react;

#[cfg(test)]
mod test_helpers;

pub use executor::{Execution, StepExecutor};
pub use parser::{ParsedResponse, ResponseFormatError, parse_response};
pub use prompt::{PromptBuilder, format_history};
pub use react::{
    DEFAULT_MAX_ITERATIONS, EMPTY_FINAL_ANSWER, MAX_ITERATIONS_ANSWER, NO_MODEL_ANSWER,
    PARSE_ERROR_ANSWER, ReactAgent,
};
