// prompt-optimizer-rs/src/export.rs
// Flat row views over a finished run, for CSV/JSON packaging and charts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::answer::RubricLabel;
use crate::model::{CaseFailure, CaseResult, OptimizationResult, StopReason};

/// One line of the per-iteration summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub iteration: u32,
    pub accuracy: f64,
    pub prompt: String,
    /// Empty for the final iteration
    pub reflection: String,
    pub failed_cases: usize,
    pub evaluation_time: f64,
    pub reflection_time: Option<f64>,
    pub mean_response_time: Option<f64>,
    pub mean_evaluation_time: Option<f64>,
    pub mean_response_prompt_tokens: Option<f64>,
    pub mean_response_completion_tokens: Option<f64>,
    pub mean_evaluation_prompt_tokens: Option<f64>,
    pub mean_evaluation_completion_tokens: Option<f64>,
    pub started_at: DateTime<Utc>,
}

/// One line of an iteration's per-case diagnostic table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRow {
    pub index: usize,
    pub input: String,
    pub expected_output: String,
    /// Empty when no answer was produced
    pub actual_output: String,
    pub is_correct: bool,
    pub response_time: f64,
    pub evaluation_time: Option<f64>,
    pub judgment: Option<RubricLabel>,
    pub analysis: Option<String>,
    pub failure: Option<String>,
}

impl From<&CaseResult> for CaseRow {
    fn from(result: &CaseResult) -> Self {
        let input = match &result.input {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            index: result.index,
            input,
            expected_output: result.expected.clone(),
            actual_output: result.actual.clone().unwrap_or_default(),
            is_correct: result.correct,
            response_time: result.response_time,
            evaluation_time: result.evaluation_time,
            judgment: result.judgment,
            analysis: result.analysis.clone(),
            failure: result.failure.as_ref().map(|f| match f {
                CaseFailure::Timeout => f.kind().to_string(),
                CaseFailure::Service(detail) | CaseFailure::Judgment(detail) => format!("{}: {}", f.kind(), detail),
            }),
        }
    }
}

/// Everything a presentation layer needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub stop_reason: StopReason,
    pub best_iteration: u32,
    pub best_accuracy: f64,
    pub best_prompt: String,
    pub history: Vec<HistoryRow>,
    pub diagnostics: BTreeMap<u32, Vec<CaseRow>>,
}

impl OptimizationResult {
    pub fn history_rows(&self) -> Vec<HistoryRow> {
        self.history()
            .iter()
            .map(|record| HistoryRow {
                iteration: record.iteration_index,
                accuracy: record.accuracy,
                prompt: record.candidate.prompt_text.clone(),
                reflection: record.reflection.clone().unwrap_or_default(),
                failed_cases: record.failed_cases(),
                evaluation_time: record.timings.evaluation,
                reflection_time: record.timings.reflection,
                mean_response_time: record.timings.mean_response_time,
                mean_evaluation_time: record.timings.mean_evaluation_time,
                mean_response_prompt_tokens: record.token_usage.mean_response_prompt_tokens,
                mean_response_completion_tokens: record.token_usage.mean_response_completion_tokens,
                mean_evaluation_prompt_tokens: record.token_usage.mean_evaluation_prompt_tokens,
                mean_evaluation_completion_tokens: record.token_usage.mean_evaluation_completion_tokens,
                started_at: record.started_at,
            })
            .collect()
    }

    /// Per-case rows keyed by iteration index.
    pub fn diagnostic_tables(&self) -> BTreeMap<u32, Vec<CaseRow>> {
        self.history()
            .iter()
            .map(|record| {
                (
                    record.iteration_index,
                    record.case_results.iter().map(CaseRow::from).collect(),
                )
            })
            .collect()
    }

    pub fn report(&self) -> RunReport {
        let best = self.best();
        RunReport {
            run_id: self.run_id,
            stop_reason: self.stop_reason,
            best_iteration: best.iteration_index,
            best_accuracy: best.accuracy,
            best_prompt: best.candidate.prompt_text.clone(),
            history: self.history_rows(),
            diagnostics: self.diagnostic_tables(),
        }
    }
}
