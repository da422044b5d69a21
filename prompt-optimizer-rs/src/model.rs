// prompt-optimizer-rs/src/model.rs
// Run state: test cases, candidates, per-case outcomes and iteration history.
//
// Every value here is created once and never edited afterwards. A new
// iteration produces a new Candidate; a new evaluation produces fresh
// CaseResults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::answer::RubricLabel;

/// One labeled example. `input` may be plain text or a structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<Value>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }

    /// The input as sent to the model: strings verbatim, anything else as JSON.
    pub fn render_input(&self) -> String {
        match &self.input {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// The question shown to a rubric judge.
    ///
    /// Structured inputs carrying a string `question` field contribute just
    /// that field; everything else falls back to the rendered input.
    pub fn question(&self) -> String {
        self.input
            .get("question")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.render_input())
    }

    pub(crate) fn has_input(&self) -> bool {
        match &self.input {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(fields) => !fields.is_empty(),
            _ => true,
        }
    }
}

/// One version of the prompt under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub prompt_text: String,
    pub iteration_index: u32,
}

impl Candidate {
    /// The iteration-1 candidate.
    pub fn seed(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            iteration_index: 1,
        }
    }

    /// The candidate for the following iteration.
    pub fn next(&self, prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            iteration_index: self.iteration_index + 1,
        }
    }
}

/// Why a case was counted incorrect without a real judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CaseFailure {
    /// The response call failed
    Service(String),
    /// A response or judge call exceeded the request timeout
    Timeout,
    /// The judge call failed or returned an unusable judgment
    Judgment(String),
}

impl CaseFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            CaseFailure::Service(_) => "service",
            CaseFailure::Timeout => "timeout",
            CaseFailure::Judgment(_) => "judgment",
        }
    }
}

/// Outcome of a single test case for a single candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Position in the original test set
    pub index: usize,
    pub input: Value,
    pub expected: String,
    /// `None` when the response call failed
    pub actual: Option<String>,
    pub correct: bool,
    /// Seconds spent on the response call, including failed attempts
    pub response_time: f64,
    /// Seconds spent on the judge call; `None` when judging made no call
    pub evaluation_time: Option<f64>,
    pub response_prompt_tokens: Option<u32>,
    pub response_completion_tokens: Option<u32>,
    pub evaluation_prompt_tokens: Option<u32>,
    pub evaluation_completion_tokens: Option<u32>,
    /// Rubric label, in rubric mode
    pub judgment: Option<RubricLabel>,
    /// Rubric analysis, in rubric mode
    pub analysis: Option<String>,
    pub failure: Option<CaseFailure>,
}

/// Wall-clock and per-case timing for one iteration, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationTimings {
    pub evaluation: f64,
    pub reflection: Option<f64>,
    pub mean_response_time: Option<f64>,
    pub mean_evaluation_time: Option<f64>,
}

/// Mean token counts per case for one iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub mean_response_prompt_tokens: Option<f64>,
    pub mean_response_completion_tokens: Option<f64>,
    pub mean_evaluation_prompt_tokens: Option<f64>,
    pub mean_evaluation_completion_tokens: Option<f64>,
}

/// One completed iteration: evaluation plus (unless it was the last) reflection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration_index: u32,
    pub candidate: Candidate,
    /// Percentage in 0..=100
    pub accuracy: f64,
    pub case_results: Vec<CaseResult>,
    /// `None` for the final iteration, which is never reflected on
    pub reflection: Option<String>,
    /// Whether the reflection response followed the requested format
    pub reflection_parsed: Option<bool>,
    pub timings: IterationTimings,
    pub token_usage: TokenUsage,
    pub started_at: DateTime<Utc>,
}

impl IterationRecord {
    pub fn failed_cases(&self) -> usize {
        self.case_results.iter().filter(|r| r.failure.is_some()).count()
    }
}

/// Why the loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Accuracy reached the threshold
    Converged,
    /// The iteration budget ran out
    Exhausted,
    /// A caller raised the cancellation flag between iterations
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StopReason::Converged => "converged",
            StopReason::Exhausted => "exhausted",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Final output of a run. The best candidate is derived from `history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub run_id: Uuid,
    pub stop_reason: StopReason,
    history: Vec<IterationRecord>,
}

impl OptimizationResult {
    /// `history` must be non-empty and ordered by iteration index.
    pub(crate) fn new(run_id: Uuid, history: Vec<IterationRecord>, stop_reason: StopReason) -> Self {
        debug_assert!(!history.is_empty());
        Self {
            run_id,
            stop_reason,
            history,
        }
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// The first record attaining the maximum accuracy.
    pub fn best(&self) -> &IterationRecord {
        let mut best = &self.history[0];
        for record in &self.history[1..] {
            if record.accuracy > best.accuracy {
                best = record;
            }
        }
        best
    }

    pub fn best_candidate(&self) -> &Candidate {
        &self.best().candidate
    }

    pub fn best_accuracy(&self) -> f64 {
        self.best().accuracy
    }

    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::Converged
    }

    /// (iteration, accuracy) pairs for an accuracy-vs-iteration chart.
    pub fn accuracy_series(&self) -> Vec<(u32, f64)> {
        self.history
            .iter()
            .map(|r| (r.iteration_index, r.accuracy))
            .collect()
    }
}
