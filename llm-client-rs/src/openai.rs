// llm-client-rs/src/openai.rs
//
// HTTP client for OpenAI-compatible chat completions endpoints
//
// This module provides:
// - A single-attempt POST per completion (no internal retries)
// - Classification of HTTP and transport failures into LlmError
// - JSON-object response format when the caller expects structured output

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use crate::message::{ChatMessage, Completion, CompletionRequest};
use crate::CompletionClient;

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompletionClient {
    /// Build a client from explicit configuration.
    ///
    /// Fails when no API key is configured; the instance is meant to be
    /// constructed once by the application and shared by reference.
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "LLM_API_KEY is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        log::info!(
            "LLM client initialized (provider: {}, model: {}, url: {})",
            config.provider(),
            config.model,
            config.api_url
        );

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LlmConfig::from_env())
    }

    fn classify_transport_error(err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else if err.is_connect() {
            LlmError::Network(format!("Connection failed: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }

    fn classify_status(status: u16, text: String) -> LlmError {
        match status {
            400 => LlmError::InvalidRequest(format!("Bad request: {}", text)),
            401 => LlmError::InvalidRequest(format!("Unauthorized: {}", text)),
            403 => LlmError::InvalidRequest(format!("Forbidden: {}", text)),
            404 => LlmError::InvalidRequest(format!("Not found: {}", text)),
            429 => LlmError::RateLimited(text),
            500 | 502 | 503 | 504 => LlmError::Server(format!("({}) {}", status, text)),
            _ => LlmError::Unexpected(format!("({}) {}", status, text)),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        request.validate()?;

        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = ChatCompletionBody {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: self.config.max_tokens,
            response_format: request
                .expect_structured
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        log::debug!(
            "Sending completion request to {} (model: {}, messages: {}, structured: {})",
            self.config.api_url,
            model,
            request.messages.len(),
            request.expect_structured
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = Self::classify_status(status.as_u16(), text);
            log::error!("Completion request failed: {}", err);
            return Err(err);
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::EmptyResponse("no content returned".to_string()))?;

        let (prompt_tokens, completion_tokens) = data
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((None, None));

        if let (Some(p), Some(c)) = (prompt_tokens, completion_tokens) {
            log::debug!("Completion finished. Used {} prompt + {} completion tokens", p, c);
        }

        Ok(Completion {
            text,
            prompt_tokens,
            completion_tokens,
        })
    }
}
