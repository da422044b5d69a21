// llm-client-rs/src/config.rs
//
// Configuration (.env file):
// - LLM_API_KEY: API key for the provider
// - LLM_API_URL: chat completions endpoint (defaults to OpenAI)
// - LLM_MODEL: default model (e.g. "gpt-4o-mini", "anthropic/claude-3.5-sonnet")
// - LLM_TIMEOUT_SECS: per-request timeout (default: 60)
// - LLM_MAX_TOKENS: optional generation cap

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            max_tokens: None,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: config_rs::env_opt("LLM_API_KEY").unwrap_or_default(),
            api_url: config_rs::env_opt("LLM_API_URL").unwrap_or(defaults.api_url),
            model: config_rs::env_opt("LLM_MODEL").unwrap_or(defaults.model),
            timeout: Duration::from_secs(config_rs::env_or("LLM_TIMEOUT_SECS", 60)),
            max_tokens: config_rs::env_parse("LLM_MAX_TOKENS"),
        }
    }

    /// Name used in logs, derived from the endpoint host or the model prefix.
    pub fn provider(&self) -> &'static str {
        if self.api_url.contains("openai.com") {
            "openai"
        } else if self.api_url.contains("openrouter.ai") {
            "openrouter"
        } else if self.api_url.contains("localhost:11434") {
            "ollama"
        } else if self.api_url.contains("localhost:1234") {
            "lmstudio"
        } else if self.model.starts_with("anthropic/") {
            "anthropic"
        } else {
            "default"
        }
    }
}
