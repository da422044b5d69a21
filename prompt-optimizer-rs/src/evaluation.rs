// prompt-optimizer-rs/src/evaluation.rs
// Runs one candidate prompt across the whole test set.
//
// Cases are independent. Up to `max_concurrency` run at once through an
// ordered buffer, so `case_results` always follows test-set order. A failed
// call marks only its own case incorrect.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use llm_client::{ChatMessage, CompletionClient, CompletionRequest};
use serde::Serialize;
use tracing::instrument;

use crate::answer::{AnswerEvaluator, JudgmentError};
use crate::error::{OptimizerError, Result};
use crate::model::{Candidate, CaseFailure, CaseResult, TestCase};

/// Check the invariants every test set must satisfy before a run.
pub fn validate_test_cases(test_cases: &[TestCase]) -> Result<()> {
    if test_cases.is_empty() {
        return Err(OptimizerError::EmptyTestSet);
    }
    for (index, case) in test_cases.iter().enumerate() {
        if !case.has_input() {
            return Err(OptimizerError::InvalidTestCase {
                index,
                reason: "input is empty".to_string(),
            });
        }
        if case.expected_output.trim().is_empty() {
            return Err(OptimizerError::InvalidTestCase {
                index,
                reason: "expected_output is empty".to_string(),
            });
        }
    }
    Ok(())
}

/// Accuracy plus per-case diagnostics and aggregates for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub accuracy: f64,
    pub case_results: Vec<CaseResult>,
    pub mean_response_time: Option<f64>,
    pub mean_evaluation_time: Option<f64>,
    pub mean_response_prompt_tokens: Option<f64>,
    pub mean_response_completion_tokens: Option<f64>,
    pub mean_evaluation_prompt_tokens: Option<f64>,
    pub mean_evaluation_completion_tokens: Option<f64>,
    pub failed_cases: usize,
}

impl EvaluationSummary {
    fn from_results(case_results: Vec<CaseResult>) -> Self {
        let total = case_results.len();
        let correct = case_results.iter().filter(|r| r.correct).count();
        let accuracy = 100.0 * correct as f64 / total as f64;

        // Aggregates only cover cases that produced an answer.
        let answered: Vec<&CaseResult> = case_results.iter().filter(|r| r.actual.is_some()).collect();

        Self {
            accuracy,
            mean_response_time: mean(answered.iter().map(|r| Some(r.response_time))),
            mean_evaluation_time: mean(answered.iter().map(|r| r.evaluation_time)),
            mean_response_prompt_tokens: mean_tokens(answered.iter().map(|r| r.response_prompt_tokens)),
            mean_response_completion_tokens: mean_tokens(
                answered.iter().map(|r| r.response_completion_tokens),
            ),
            mean_evaluation_prompt_tokens: mean_tokens(answered.iter().map(|r| r.evaluation_prompt_tokens)),
            mean_evaluation_completion_tokens: mean_tokens(
                answered.iter().map(|r| r.evaluation_completion_tokens),
            ),
            failed_cases: case_results.iter().filter(|r| r.failure.is_some()).count(),
            case_results,
        }
    }
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn mean_tokens(values: impl Iterator<Item = Option<u32>>) -> Option<f64> {
    mean(values.map(|v| v.map(f64::from)))
}

/// Settings the prompt evaluator needs from the run configuration.
#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    pub response_temperature: f32,
    pub model: Option<String>,
    pub max_concurrency: usize,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            response_temperature: 0.0,
            model: None,
            max_concurrency: 1,
        }
    }
}

pub struct PromptEvaluator {
    client: Arc<dyn CompletionClient>,
    answer_evaluator: Arc<dyn AnswerEvaluator>,
    settings: EvaluatorSettings,
}

impl PromptEvaluator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        answer_evaluator: Arc<dyn AnswerEvaluator>,
        settings: EvaluatorSettings,
    ) -> Self {
        Self {
            client,
            answer_evaluator,
            settings,
        }
    }

    /// Score `candidate` against every test case.
    #[instrument(
        name = "evaluate_prompt",
        skip(self, candidate, test_cases),
        fields(iteration = candidate.iteration_index, cases = test_cases.len())
    )]
    pub async fn evaluate(&self, candidate: &Candidate, test_cases: &[TestCase]) -> Result<EvaluationSummary> {
        if test_cases.is_empty() {
            return Err(OptimizerError::EmptyTestSet);
        }

        let prompt = candidate.prompt_text.as_str();
        let case_results: Vec<CaseResult> = stream::iter(test_cases.iter().enumerate())
            .map(|(index, case)| self.evaluate_case(prompt, index, case))
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let summary = EvaluationSummary::from_results(case_results);

        tracing::info!(
            accuracy = summary.accuracy,
            failed_cases = summary.failed_cases,
            mean_response_time = ?summary.mean_response_time,
            "evaluation completed"
        );

        Ok(summary)
    }

    async fn evaluate_case(&self, prompt: &str, index: usize, case: &TestCase) -> CaseResult {
        let request = CompletionRequest::new(
            vec![ChatMessage::system(prompt), ChatMessage::user(case.render_input())],
            self.settings.response_temperature,
        )
        .with_model(self.settings.model.clone());

        let mut result = CaseResult {
            index,
            input: case.input.clone(),
            expected: case.expected_output.clone(),
            actual: None,
            correct: false,
            response_time: 0.0,
            evaluation_time: None,
            response_prompt_tokens: None,
            response_completion_tokens: None,
            evaluation_prompt_tokens: None,
            evaluation_completion_tokens: None,
            judgment: None,
            analysis: None,
            failure: None,
        };

        let started = Instant::now();
        let response = self.client.complete(request).await;
        result.response_time = started.elapsed().as_secs_f64();

        let completion = match response {
            Ok(completion) => completion,
            Err(err) => {
                tracing::warn!(case = index, error = %err, "response call failed; case counted incorrect");
                let failure = if err.is_timeout() {
                    CaseFailure::Timeout
                } else {
                    CaseFailure::Service(err.to_string())
                };
                metrics::increment_counter!("prompt_optimizer_case_failures_total", "kind" => failure.kind());
                result.failure = Some(failure);
                return result;
            }
        };

        result.response_prompt_tokens = completion.prompt_tokens;
        result.response_completion_tokens = completion.completion_tokens;

        let started = Instant::now();
        let judgment = self
            .answer_evaluator
            .evaluate(&case.question(), &case.expected_output, Some(&completion.text))
            .await;
        let judged_in = started.elapsed().as_secs_f64();
        result.actual = Some(completion.text);

        match judgment {
            Ok(judgment) => {
                // Local comparisons have no meaningful evaluation time.
                result.evaluation_time = judgment.service_call.then_some(judged_in);
                result.correct = judgment.correct;
                result.judgment = judgment.label;
                result.analysis = judgment.analysis;
                result.evaluation_prompt_tokens = judgment.prompt_tokens;
                result.evaluation_completion_tokens = judgment.completion_tokens;
            }
            Err(err) => {
                result.evaluation_time = Some(judged_in);
                let failure = match err {
                    JudgmentError::Parse(parse) => {
                        tracing::error!(case = index, error = %parse, "unusable judgment; case counted incorrect");
                        CaseFailure::Judgment(parse.to_string())
                    }
                    JudgmentError::Service(service) => {
                        tracing::warn!(case = index, error = %service, "judge call failed; case counted incorrect");
                        if service.is_timeout() {
                            CaseFailure::Timeout
                        } else {
                            CaseFailure::Service(service.to_string())
                        }
                    }
                };
                metrics::increment_counter!("prompt_optimizer_case_failures_total", "kind" => failure.kind());
                result.failure = Some(failure);
            }
        }

        result
    }
}
