//! Prompt construction.
//!
//! The system instructions are rendered once per agent from the tool
//! registry. Each iteration's user prompt repeats them, followed by the
//! question, the serialized run history and a directive to continue.

use chrono::{Local, NaiveDate};
use thoughtline_core::step::Step;
use thoughtline_core::tool::ToolRegistry;

/// Builds the system prompt and per-iteration prompts for one agent.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
}

impl PromptBuilder {
    /// Render instructions for `registry`, dated today.
    pub fn new(registry: &ToolRegistry) -> Self {
        Self::with_date(registry, Local::now().date_naive())
    }

    /// Render instructions with a fixed date.
    pub fn with_date(registry: &ToolRegistry, date: NaiveDate) -> Self {
        Self {
            system_prompt: render_system_prompt(registry, date),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// The complete prompt for the next iteration.
    pub fn build(&self, query: &str, history: &[Step]) -> String {
        let mut prompt = format!("{}\n\nQuestion: {}\n\n", self.system_prompt, query);
        prompt.push_str(&format_history(history));
        prompt.push_str("\nNow continue with next steps by strictly following the required format.\n");
        prompt
    }
}

fn render_system_prompt(registry: &ToolRegistry, date: NaiveDate) -> String {
    let action_types = registry.action_types();
    let tool_names = if action_types.is_empty() {
        "none".to_string()
    } else {
        action_types.join(", ")
    };
    let tools_description = registry
        .descriptors()
        .iter()
        .map(|d| d.render())
        .collect::<Vec<_>>()
        .join("\n");
    let current_date = date.format("%B %d, %Y");

    format!(
        r#"You are an AI assistant that follows the ReAct (Reasoning + Acting) pattern.
Your goal is to help users by breaking down complex tasks into a series of thought-out steps and actions.

You have access to these tools: {tool_names}

{tools_description}
For each iteration, follow these steps:
1. Thought: Think about what needs to be done.
2. Action: Decide on an appropriate Action if needed.
3. PAUSE: Optionally reflect on the observations so far before continuing.
4. Repeat Thought/Action as needed until you find the final answer.

Format:
Thought: Your reasoning
Action: {{"action_identifier": "<action_type>", "input": <input_data>}}

Format once you find the final answer:
Thought: I now know the final answer
Final Answer: [your answer]

Important:
- Think step-by-step
- Use at most one Action per response and wait for its Observation
- Never write an Observation yourself
- Use available tools wisely
- If stuck, reflect and retry
- Do not hallucinate and use tools if needed
- The current date is {current_date}
- If you follow the format strictly, you will be recognized as an excellent and trustworthy AI assistant.
"#
    )
}

/// Serialize prior steps in the transcript line protocol.
pub fn format_history(history: &[Step]) -> String {
    let mut out = String::new();
    for step in history {
        if let Some(pause) = &step.pause_reflection {
            out.push_str(&format!("PAUSE: {pause}\n"));
        }
        if let Some(thought) = &step.thought {
            out.push_str(&format!("Thought: {thought}\n"));
        }
        if let Some(action) = &step.action {
            out.push_str(&format!("Action: {}\n", action.to_inline_json()));
        }
        if let Some(observation) = &step.observation {
            out.push_str(&format!("Observation: {}\n", observation.result));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::StaticTool;
    use std::sync::Arc;
    use thoughtline_core::step::{Action, Observation};
    use thoughtline_core::tool::Tool;

    fn registry() -> ToolRegistry {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(StaticTool::new("calculate", "4")),
            Arc::new(StaticTool::new("search", "results")),
        ];
        ToolRegistry::from_tools(tools).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn system_prompt_lists_tools_and_date() {
        let builder = PromptBuilder::with_date(&registry(), date());
        let system = builder.system_prompt();
        assert!(system.contains("You have access to these tools: calculate, search"));
        assert!(system.contains("Action Type: calculate\n"));
        assert!(system.contains("Action Type: search\n"));
        assert!(system.contains("The current date is March 07, 2025"));
        assert!(system.contains(r#"Action: {"action_identifier": "<action_type>""#));
    }

    #[test]
    fn tool_blocks_follow_registration_order() {
        let system = PromptBuilder::with_date(&registry(), date())
            .system_prompt()
            .to_string();
        let calc = system.find("Action Type: calculate").unwrap();
        let search = system.find("Action Type: search").unwrap();
        assert!(calc < search);
    }

    #[test]
    fn empty_registry_still_renders() {
        let builder = PromptBuilder::with_date(&ToolRegistry::new(), date());
        assert!(builder.system_prompt().contains("You have access to these tools: none"));
    }

    #[test]
    fn build_without_history() {
        let builder = PromptBuilder::with_date(&registry(), date());
        let prompt = builder.build("What is 2+2?", &[]);
        assert!(prompt.starts_with(builder.system_prompt()));
        assert!(prompt.contains("\n\nQuestion: What is 2+2?\n\n"));
        assert!(prompt.ends_with(
            "\nNow continue with next steps by strictly following the required format.\n"
        ));
        assert!(!prompt.contains("Observation: "));
    }

    #[test]
    fn history_lines_appear_in_protocol_order() {
        let step = Step {
            thought: Some("compute".into()),
            pause_reflection: Some("checking".into()),
            action: Some(Action::new("calculate", serde_json::json!("2+2"))),
            observation: Some(Observation::new("4")),
        };
        assert_eq!(
            format_history(&[step]),
            "PAUSE: checking\nThought: compute\nAction: {\"action_identifier\":\"calculate\",\"input\":\"2+2\"}\nObservation: 4\n"
        );
    }

    #[test]
    fn absent_fields_are_skipped() {
        let steps = vec![
            Step {
                thought: Some("first".into()),
                ..Step::default()
            },
            Step::default(),
            Step {
                thought: Some("second".into()),
                ..Step::default()
            },
        ];
        assert_eq!(format_history(&steps), "Thought: first\nThought: second\n");
    }

    #[test]
    fn build_is_pure() {
        let builder = PromptBuilder::with_date(&registry(), date());
        let history = vec![Step {
            thought: Some("t".into()),
            ..Step::default()
        }];
        assert_eq!(builder.build("q", &history), builder.build("q", &history));
    }
}
