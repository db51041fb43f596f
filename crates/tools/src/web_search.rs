//! Web search tool — DuckDuckGo Instant Answer API.
//!
//! Returns the abstract (when DuckDuckGo has one) followed by related
//! topics, capped at a configurable number of results. Network failures
//! are reported to the model as text rather than failing the action.

use async_trait::async_trait;
use serde::Deserialize;
use thoughtline_core::error::ToolError;
use thoughtline_core::tool::Tool;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";

pub struct WebSearchTool {
    endpoint: String,
    max_results: usize,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(max_results: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("thoughtline/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            max_results: max_results.max(1),
            client,
        }
    }

    /// Point the tool at a different Instant Answer compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch(&self, query: &str) -> Result<InstantAnswer, reqwest::Error> {
        self.client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "DuckDuckGo Search"
    }

    fn description(&self) -> &str {
        "Searches internet using DuckDuckGo for a given query and returns top 5 results."
    }

    fn action_type(&self) -> &str {
        "search"
    }

    fn input_format(&self) -> &str {
        "A search query as a string. Example: 'Latest advancements in AI'"
    }

    async fn run(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let query = match &input {
            serde_json::Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if query.is_empty() {
            return Err(ToolError::InvalidInput("search query is empty".into()));
        }

        debug!(query = %query, "Running web search");
        match self.fetch(&query).await {
            Ok(answer) => Ok(format_results(&answer, self.max_results)),
            Err(e) => Ok(format!("Error performing search: {e}")),
        }
    }
}

// --- Instant Answer API types (internal) ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// A related topic is either a single result or a named group of results.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Result {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

struct SearchHit<'a> {
    title: &'a str,
    body: &'a str,
}

fn collect_hits<'a>(topics: &'a [RelatedTopic], out: &mut Vec<SearchHit<'a>>) {
    for topic in topics {
        match topic {
            RelatedTopic::Result { text, first_url } if !text.is_empty() => {
                out.push(SearchHit {
                    title: text,
                    body: first_url,
                });
            }
            RelatedTopic::Result { .. } => {}
            RelatedTopic::Group { topics } => collect_hits(topics, out),
        }
    }
}

/// Render up to `max_results` hits as a numbered list.
fn format_results(answer: &InstantAnswer, max_results: usize) -> String {
    let mut hits = Vec::new();
    if !answer.abstract_text.is_empty() {
        let title = if answer.heading.is_empty() {
            answer.abstract_url.as_str()
        } else {
            answer.heading.as_str()
        };
        hits.push(SearchHit {
            title,
            body: &answer.abstract_text,
        });
    }
    collect_hits(&answer.related_topics, &mut hits);

    if hits.is_empty() {
        return "No results found.".into();
    }

    hits.iter()
        .take(max_results)
        .enumerate()
        .map(|(i, hit)| format!("{}. {}\n   {}", i + 1, hit.title, hit.body))
        .collect::<Vec<_>>()
        .join("\n")
}
