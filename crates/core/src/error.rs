//! Error types for the thoughtline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for setup-time operations.
///
/// A running agent never surfaces this type: every failure during a run is
/// folded into the run's transcript or its final answer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty completion from {0}")]
    EmptyCompletion(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Tool panicked: {0}")]
    Panicked(String),

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error("Remote tool bridge error: {0}")]
    Bridge(String),

    /// The remote server answered with a JSON-RPC error; the session is intact.
    #[error("MCP server {server} returned error: {message}")]
    Remote { server: String, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate action type '{action_type}' (already registered by '{existing}', rejected '{rejected}')")]
    DuplicateActionType {
        action_type: String,
        existing: String,
        rejected: String,
    },

    #[error("Action type must not be empty (tool '{0}')")]
    EmptyActionType(String),

    #[error("Action type '{action_type}' of tool '{tool}' has surrounding whitespace")]
    UntrimmedActionType { action_type: String, tool: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = ToolError::Timeout {
            tool_name: "search".into(),
            timeout_secs: 30,
        };
        assert_eq!(err.to_string(), "Tool timed out: search after 30s");
    }

    #[test]
    fn registry_error_names_both_tools() {
        let err = Error::Registry(RegistryError::DuplicateActionType {
            action_type: "search".into(),
            existing: "DuckDuckGo Search".into(),
            rejected: "Other Search".into(),
        });
        let text = err.to_string();
        assert!(text.contains("'search'"));
        assert!(text.contains("DuckDuckGo Search"));
        assert!(text.contains("Other Search"));
    }
}
