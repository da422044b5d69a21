// prompt-optimizer-rs/src/initial_prompt.rs
// Seed prompt generation for iteration 1.

use std::sync::Arc;

use llm_client::{ChatMessage, CompletionClient, CompletionRequest};

use crate::error::{OptimizerError, Result};
use crate::prompts;

pub struct InitialPromptGenerator {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    model: Option<String>,
}

impl InitialPromptGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32, model: Option<String>) -> Self {
        Self {
            client,
            temperature,
            model,
        }
    }

    /// Ask the model for a starting prompt.
    ///
    /// Without a task description (or with a blank one) the built-in
    /// context-grounded question answering task is used.
    pub async fn generate(&self, task_description: Option<&str>) -> Result<String> {
        let task = task_description
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(prompts::CONTEXT_QA_TASK);

        let request = CompletionRequest::new(vec![ChatMessage::user(prompts::seed_request(task))], self.temperature)
            .with_model(self.model.clone());

        let completion = self
            .client
            .complete(request)
            .await
            .map_err(|e| OptimizerError::InitGeneration(e.to_string()))?;

        let prompt = completion.text.trim();
        if prompt.is_empty() {
            return Err(OptimizerError::InitGeneration("model returned an empty prompt".to_string()));
        }

        tracing::info!(chars = prompt.len(), "generated initial prompt");
        Ok(prompt.to_string())
    }
}
