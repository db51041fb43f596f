//! Provider router — selects the correct LLM provider based on config.
//!
//! A provider is only registered when it can actually authenticate: either
//! it has an API key (its own or the global one) or it is a local server
//! that needs none. An empty router means "no model connected".

use std::collections::HashMap;
use std::sync::Arc;

use thoughtline_config::AppConfig;
use thoughtline_core::provider::Provider;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone());
        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        if let Some(provider) = make_provider(name, &base_url, api_key) {
            router.register(name.clone(), provider);
        }
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() {
        let base_url = default_base_url(&config.default_provider);
        if let Some(provider) =
            make_provider(&config.default_provider, &base_url, config.api_key.clone())
        {
            router.register(config.default_provider.clone(), provider);
        }
    }

    debug!(providers = ?router.list(), default = %router.default_provider, "Provider router built");
    router
}

/// The model to request from the default provider.
pub fn resolve_model(config: &AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

fn make_provider(name: &str, base_url: &str, api_key: Option<String>) -> Option<Arc<dyn Provider>> {
    let api_key = api_key.filter(|k| !k.trim().is_empty());
    match (name, api_key) {
        ("openrouter", Some(key)) => Some(Arc::new(OpenAiCompatProvider::openrouter(key))),
        ("ollama", _) => Some(Arc::new(OpenAiCompatProvider::ollama(Some(base_url)))),
        ("vllm" | "llamacpp" | "llama.cpp", key) => Some(Arc::new(OpenAiCompatProvider::new(
            name,
            base_url,
            key.unwrap_or_default(),
        ))),
        (_, Some(key)) => Some(Arc::new(OpenAiCompatProvider::new(name, base_url, key))),
        (_, None) => {
            debug!(provider = name, "Skipping provider without API key");
            None
        }
    }
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
