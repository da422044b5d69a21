// prompt-optimizer-rs/src/optimizer.rs
// The optimization loop.
//
// SEEDING -> EVALUATING -> (CONVERGED | REFLECTING -> EVALUATING ...) until
// the threshold is met or the iteration budget runs out. Iterations are
// strictly sequential: each one consumes the previous reflection's prompt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use llm_client::CompletionClient;
use tracing::instrument;
use uuid::Uuid;

use crate::answer::build_evaluator;
use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, Result};
use crate::evaluation::{validate_test_cases, EvaluatorSettings, PromptEvaluator};
use crate::initial_prompt::InitialPromptGenerator;
use crate::model::{
    Candidate, IterationRecord, IterationTimings, OptimizationResult, StopReason, TestCase, TokenUsage,
};
use crate::observer::IterationObserver;
use crate::reflector::Reflector;
use crate::retry::RetryingClient;

/// Cooperative stop signal, checked before each evaluation.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct PromptOptimizer {
    client: Arc<dyn CompletionClient>,
    config: OptimizerConfig,
    task_description: Option<String>,
    observers: Vec<Arc<dyn IterationObserver>>,
    cancellation: CancellationFlag,
}

impl PromptOptimizer {
    /// Every collaborator shares `client`, wrapped in the configured retry
    /// and timeout policy.
    pub fn new(client: Arc<dyn CompletionClient>, config: OptimizerConfig) -> Self {
        let client: Arc<dyn CompletionClient> = Arc::new(RetryingClient::new(
            client,
            config.retry.clone(),
            config.request_timeout,
        ));
        Self {
            client,
            config,
            task_description: None,
            observers: Vec::new(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_task_description(mut self, task_description: impl Into<String>) -> Self {
        let task_description = task_description.into();
        self.task_description = (!task_description.trim().is_empty()).then_some(task_description);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn IterationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Run the loop to completion.
    ///
    /// Fails only on precondition violations, seed generation failure, or
    /// cancellation before the first evaluation. Everything else is
    /// contained and shows up in the per-case diagnostics.
    #[instrument(
        name = "optimize",
        skip(self, test_cases),
        fields(
            cases = test_cases.len(),
            max_iterations = self.config.max_iterations,
            threshold = self.config.accuracy_threshold
        )
    )]
    pub async fn optimize(&self, test_cases: &[TestCase]) -> Result<OptimizationResult> {
        self.config.validate()?;
        validate_test_cases(test_cases)?;

        if self.cancellation.is_cancelled() {
            return Err(OptimizerError::Cancelled);
        }

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, mode = %self.config.evaluation_mode, "starting optimization");

        let seed = self.seed_prompt().await?;
        for observer in &self.observers {
            observer.on_seed(&seed);
        }

        let answer_evaluator = build_evaluator(
            self.config.evaluation_mode,
            self.client.clone(),
            self.config.judge_temperature,
            self.config.model.clone(),
        );
        let evaluator = PromptEvaluator::new(
            self.client.clone(),
            answer_evaluator,
            EvaluatorSettings {
                response_temperature: self.config.response_temperature,
                model: self.config.model.clone(),
                max_concurrency: self.config.max_concurrency,
            },
        );
        let reflector = Reflector::new(
            self.client.clone(),
            self.task_description.clone(),
            self.config.model.clone(),
        );

        let mut candidate = Candidate::seed(seed);
        let mut history: Vec<IterationRecord> = Vec::new();

        let stop_reason = loop {
            if self.cancellation.is_cancelled() {
                if history.is_empty() {
                    return Err(OptimizerError::Cancelled);
                }
                tracing::info!(%run_id, completed = history.len(), "optimization cancelled");
                break StopReason::Cancelled;
            }

            let started_at = Utc::now();
            let clock = Instant::now();
            let summary = evaluator.evaluate(&candidate, test_cases).await?;
            let evaluation_secs = clock.elapsed().as_secs_f64();

            metrics::increment_counter!("prompt_optimizer_iterations_total");
            metrics::histogram!("prompt_optimizer_accuracy", summary.accuracy);

            for observer in &self.observers {
                observer.on_evaluated(&candidate, &summary);
            }

            let stop = if summary.accuracy >= self.config.accuracy_threshold {
                Some(StopReason::Converged)
            } else if candidate.iteration_index >= self.config.max_iterations {
                Some(StopReason::Exhausted)
            } else {
                None
            };

            // The last evaluated candidate is never reflected on.
            let reflection = match stop {
                Some(_) => None,
                None => {
                    let clock = Instant::now();
                    let reflection = reflector
                        .reflect(
                            &candidate,
                            &summary.case_results,
                            summary.accuracy,
                            self.config.reflection_temperature,
                        )
                        .await;
                    Some((reflection, clock.elapsed().as_secs_f64()))
                }
            };

            let (reflection_text, reflection_parsed, reflection_secs, next_prompt) = match reflection {
                Some((r, secs)) => (Some(r.text), Some(r.parsed), Some(secs), Some(r.improved_prompt)),
                None => (None, None, None, None),
            };

            let record = IterationRecord {
                iteration_index: candidate.iteration_index,
                candidate: candidate.clone(),
                accuracy: summary.accuracy,
                reflection: reflection_text,
                reflection_parsed,
                timings: IterationTimings {
                    evaluation: evaluation_secs,
                    reflection: reflection_secs,
                    mean_response_time: summary.mean_response_time,
                    mean_evaluation_time: summary.mean_evaluation_time,
                },
                token_usage: TokenUsage {
                    mean_response_prompt_tokens: summary.mean_response_prompt_tokens,
                    mean_response_completion_tokens: summary.mean_response_completion_tokens,
                    mean_evaluation_prompt_tokens: summary.mean_evaluation_prompt_tokens,
                    mean_evaluation_completion_tokens: summary.mean_evaluation_completion_tokens,
                },
                case_results: summary.case_results,
                started_at,
            };

            tracing::info!(
                %run_id,
                iteration = record.iteration_index,
                accuracy = record.accuracy,
                failed_cases = record.failed_cases(),
                "iteration complete"
            );

            history.push(record);
            if let Some(record) = history.last() {
                for observer in &self.observers {
                    observer.on_iteration(record);
                }
            }

            match (stop, next_prompt) {
                (Some(reason), _) => break reason,
                (None, Some(prompt)) => candidate = candidate.next(prompt),
                (None, None) => break StopReason::Exhausted,
            }
        };

        metrics::increment_counter!("prompt_optimizer_runs_total", "stop_reason" => stop_reason.to_string());

        let result = OptimizationResult::new(run_id, history, stop_reason);
        tracing::info!(
            %run_id,
            %stop_reason,
            iterations = result.history().len(),
            best_accuracy = result.best_accuracy(),
            "optimization finished"
        );

        for observer in &self.observers {
            observer.on_complete(&result);
        }

        Ok(result)
    }

    async fn seed_prompt(&self) -> Result<String> {
        if let Some(starter) = self.config.starter_prompt.as_deref() {
            if !starter.trim().is_empty() {
                tracing::info!("using configured starter prompt");
                return Ok(starter.to_string());
            }
        }

        InitialPromptGenerator::new(
            self.client.clone(),
            self.config.seed_temperature,
            self.config.model.clone(),
        )
        .generate(self.task_description.as_deref())
        .await
    }
}
