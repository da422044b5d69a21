// prompt-optimizer-rs/src/reflector.rs
// Critique-and-rewrite step between iterations.

use std::sync::Arc;

use llm_client::{ChatMessage, CompletionClient, CompletionRequest};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::model::{Candidate, CaseResult};
use crate::prompts::{self, IMPROVED_PROMPT_MARKER, REFLECTION_MARKER};

/// Outcome of one reflection step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reflection {
    /// The critique, or the raw response when the markers were missing
    pub text: String,
    /// The prompt for the next iteration
    pub improved_prompt: String,
    /// False when the response could not be split and the prompt was kept
    pub parsed: bool,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

/// Split a response on `REFLECTION:` and `IMPROVED PROMPT:`.
///
/// Returns `None` when either marker is missing, they are out of order, or
/// the improved prompt is empty.
pub fn parse_reflection(response: &str) -> Option<(String, String)> {
    let reflection_at = response.find(REFLECTION_MARKER)?;
    let body_at = reflection_at + REFLECTION_MARKER.len();
    let prompt_at = body_at + response[body_at..].find(IMPROVED_PROMPT_MARKER)?;

    let reflection = response[body_at..prompt_at].trim();
    let improved = response[prompt_at + IMPROVED_PROMPT_MARKER.len()..].trim();
    if improved.is_empty() {
        return None;
    }
    Some((reflection.to_string(), improved.to_string()))
}

#[derive(Serialize)]
struct CaseView<'a> {
    input: &'a Value,
    expected_output: &'a str,
    actual_output: Option<&'a str>,
    is_correct: bool,
}

fn serialize_results(case_results: &[CaseResult]) -> String {
    let views: Vec<CaseView<'_>> = case_results
        .iter()
        .map(|r| CaseView {
            input: &r.input,
            expected_output: &r.expected,
            actual_output: r.actual.as_deref(),
            is_correct: r.correct,
        })
        .collect();
    serde_json::to_string_pretty(&views).unwrap_or_else(|_| "[]".to_string())
}

pub struct Reflector {
    client: Arc<dyn CompletionClient>,
    task_description: Option<String>,
    model: Option<String>,
}

impl Reflector {
    pub fn new(client: Arc<dyn CompletionClient>, task_description: Option<String>, model: Option<String>) -> Self {
        Self {
            client,
            task_description,
            model,
        }
    }

    /// Critique `candidate` and propose its replacement.
    ///
    /// Never fails: a service error or an unparsable response keeps the
    /// current prompt so the loop can continue.
    #[instrument(
        skip(self, candidate, case_results),
        fields(iteration = candidate.iteration_index)
    )]
    pub async fn reflect(
        &self,
        candidate: &Candidate,
        case_results: &[CaseResult],
        accuracy: f64,
        temperature: f32,
    ) -> Reflection {
        let request = CompletionRequest::new(
            vec![ChatMessage::user(prompts::reflection_request(
                self.task_description.as_deref(),
                &candidate.prompt_text,
                accuracy,
                &serialize_results(case_results),
            ))],
            temperature,
        )
        .with_model(self.model.clone());

        let completion = match self.client.complete(request).await {
            Ok(completion) => completion,
            Err(err) => {
                tracing::warn!(error = %err, "reflection call failed; keeping current prompt");
                metrics::increment_counter!("prompt_optimizer_reflection_fallbacks_total");
                return Reflection {
                    text: format!("<reflection unavailable: {}>", err),
                    improved_prompt: candidate.prompt_text.clone(),
                    parsed: false,
                    prompt_tokens: None,
                    completion_tokens: None,
                };
            }
        };

        match parse_reflection(&completion.text) {
            Some((text, improved_prompt)) => Reflection {
                text,
                improved_prompt,
                parsed: true,
                prompt_tokens: completion.prompt_tokens,
                completion_tokens: completion.completion_tokens,
            },
            None => {
                tracing::warn!("reflection response lacks the expected markers; keeping current prompt");
                metrics::increment_counter!("prompt_optimizer_reflection_fallbacks_total");
                Reflection {
                    text: completion.text,
                    improved_prompt: candidate.prompt_text.clone(),
                    parsed: false,
                    prompt_tokens: completion.prompt_tokens,
                    completion_tokens: completion.completion_tokens,
                }
            }
        }
    }
}
