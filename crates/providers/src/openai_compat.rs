//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any
//! endpoint exposing `/chat/completions`. One system message and one user
//! message go out; the first choice's text comes back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thoughtline_core::error::ProviderError;
use thoughtline_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
            client,
        }
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
            .with_header("HTTP-Referer", "https://github.com/thoughtline/thoughtline")
            .with_header("X-Title", "thoughtline")
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Attach an extra header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the `/chat/completions` request body.
    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let messages = [
            ApiMessage {
                role: "system".into(),
                content: request.system_prompt.clone(),
            },
            ApiMessage {
                role: "user".into(),
                content: request.user_prompt.clone(),
            },
        ];

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// Convert a decoded API response into our response type.
    fn into_response(
        &self,
        api_response: ApiResponse,
    ) -> Result<ProviderResponse, ProviderError> {
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmptyCompletion(self.name.clone()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            model: api_response.model,
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        for (name, value) in &self.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        self.into_response(api_response)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openrouter_constructor() {
        let p = OpenAiCompatProvider::openrouter("sk-test");
        assert_eq!(p.name(), "openrouter");
        assert_eq!(p.base_url(), "https://openrouter.ai/api/v1");
        assert!(p.extra_headers.iter().any(|(k, _)| k == "X-Title"));
    }

    #[test]
    fn ollama_constructor() {
        let p = OpenAiCompatProvider::ollama(None);
        assert_eq!(p.name(), "ollama");
        assert!(p.base_url().contains("11434"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let p = OpenAiCompatProvider::new("custom", "http://localhost:8000/v1/", "k");
        assert_eq!(p.base_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn request_body_carries_system_and_user_messages() {
        let mut req = ProviderRequest::new("gpt-4o", "be helpful", "Question: 2+2");
        req.max_tokens = Some(256);
        let body = OpenAiCompatProvider::request_body(&req);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 256);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "be helpful");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Question: 2+2");
    }

    #[test]
    fn request_body_omits_unset_max_tokens() {
        let req = ProviderRequest::new("gpt-4o", "s", "u");
        let body = OpenAiCompatProvider::request_body(&req);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn parse_api_response() {
        let json = r#"{
            "id": "chatcmpl-123",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Final Answer: 4"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let api: ApiResponse = serde_json::from_str(json).unwrap();
        let p = OpenAiCompatProvider::openai("k");
        let resp = p.into_response(api).unwrap();
        assert_eq!(resp.content, "Final Answer: 4");
        assert_eq!(resp.model, "gpt-4o");
        assert_eq!(resp.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn null_content_becomes_empty_string() {
        let json = r#"{"model": "m", "choices": [{"message": {"content": null}}]}"#;
        let api: ApiResponse = serde_json::from_str(json).unwrap();
        let resp = OpenAiCompatProvider::openai("k").into_response(api).unwrap();
        assert_eq!(resp.content, "");
        assert!(resp.usage.is_none());
    }

    #[test]
    fn no_choices_is_empty_completion() {
        let api: ApiResponse = serde_json::from_str(r#"{"model": "m", "choices": []}"#).unwrap();
        let err = OpenAiCompatProvider::openai("k")
            .into_response(api)
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyCompletion(ref name) if name == "openai"));
    }
}
