//! Ares live internet search (Traversaal).
//!
//! Posts the query to the Ares `live/predict` endpoint and renders the
//! summary plus related links. A missing API key is reported to the model as
//! text so it can fall back to another tool.

use async_trait::async_trait;
use serde::Deserialize;
use thoughtline_core::error::ToolError;
use thoughtline_core::tool::Tool;
use tracing::{debug, warn};

pub struct AresSearchTool {
    api_key: Option<String>,
    api_url: String,
    client: reqwest::Client,
}

impl AresSearchTool {
    pub fn new(api_key: Option<String>, api_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_url: api_url.into(),
            client,
        }
    }

    pub fn from_config(config: &thoughtline_config::AresConfig) -> Self {
        Self::new(config.api_key.clone(), &config.api_url)
    }
}

#[async_trait]
impl Tool for AresSearchTool {
    fn name(&self) -> &str {
        "Ares Internet Search"
    }

    fn description(&self) -> &str {
        "Uses Ares API to search live information from the internet and returns a clean summary and related links."
    }

    fn action_type(&self) -> &str {
        "ares_internet_search"
    }

    fn input_format(&self) -> &str {
        "A search query as a string. Example: 'Best restaurants in San Francisco'"
    }

    async fn run(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let Some(query) = input.as_str() else {
            return Ok("Error: Expected a search query string.".into());
        };
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(
                "Error: Ares API key is missing. Please set the ARES_API_KEY environment variable."
                    .into(),
            );
        };

        let prompt = query.trim_matches(|c| c == '\'' || c == '"');
        debug!(query = %prompt, "Running Ares search");

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({ "query": [prompt] }))
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.action_type().into(),
                reason: format!("HTTP request failed - {e}"),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let text = response.text().await.unwrap_or_default();
            warn!(status, "Ares API returned error");
            return Ok(format!("Error: Ares API returned {status} - {text}"));
        }

        let body: AresResponse = response.json().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.action_type().into(),
            reason: format!("invalid response body - {e}"),
        })?;

        Ok(format_response(&body))
    }
}

#[derive(Debug, Default, Deserialize)]
struct AresResponse {
    #[serde(default)]
    data: AresData,
}

#[derive(Debug, Default, Deserialize)]
struct AresData {
    #[serde(default)]
    response_text: String,
    #[serde(default)]
    web_url: Vec<String>,
}

fn format_response(body: &AresResponse) -> String {
    let summary = body.data.response_text.trim();
    if summary.is_empty() {
        return "No information found for this query. Please try a different search term.".into();
    }

    let mut output = format!("Search Summary:\n{summary}\n\n");
    if !body.data.web_url.is_empty() {
        output.push_str("Related Links:\n");
        for (idx, url) in body.data.web_url.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", idx + 1, url));
        }
    }
    output.trim().to_string()
}
