// prompt-optimizer-rs/src/observer.rs
// Progress callbacks for presentation layers.
//
// Observers only watch. They receive shared references and return nothing,
// so they cannot steer the loop.

use std::sync::Mutex;

use crate::evaluation::EvaluationSummary;
use crate::model::{Candidate, IterationRecord, OptimizationResult};

/// Receives progress events from a running optimization.
pub trait IterationObserver: Send + Sync {
    /// The iteration-1 prompt is known.
    fn on_seed(&self, _prompt: &str) {}

    /// A candidate has been scored; its reflection (if any) is still pending.
    fn on_evaluated(&self, _candidate: &Candidate, _summary: &EvaluationSummary) {}

    /// An iteration record was appended to the history.
    fn on_iteration(&self, _record: &IterationRecord) {}

    fn on_complete(&self, _result: &OptimizationResult) {}
}

/// Reports progress through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl IterationObserver for LoggingObserver {
    fn on_seed(&self, prompt: &str) {
        log::info!("Seed prompt ready ({} chars)", prompt.len());
    }

    fn on_iteration(&self, record: &IterationRecord) {
        log::info!(
            "Iteration {}: accuracy {:.2}% ({} failed cases, evaluation {:.2}s)",
            record.iteration_index,
            record.accuracy,
            record.failed_cases(),
            record.timings.evaluation
        );
    }

    fn on_complete(&self, result: &OptimizationResult) {
        log::info!(
            "Optimization {} {} after {} iterations; best accuracy {:.2}% at iteration {}",
            result.run_id,
            result.stop_reason,
            result.history().len(),
            result.best_accuracy(),
            result.best().iteration_index
        );
    }
}

/// Buffers every event in memory; handy for UIs that poll and for tests.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    seeds: Mutex<Vec<String>>,
    evaluated: Mutex<Vec<(u32, f64)>>,
    records: Mutex<Vec<IterationRecord>>,
    completed: Mutex<usize>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeds(&self) -> Vec<String> {
        self.seeds.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// (iteration, accuracy) for every evaluation seen.
    pub fn evaluations(&self) -> Vec<(u32, f64)> {
        self.evaluated.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn records(&self) -> Vec<IterationRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn completions(&self) -> usize {
        *self.completed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl IterationObserver for CollectingObserver {
    fn on_seed(&self, prompt: &str) {
        self.seeds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
    }

    fn on_evaluated(&self, candidate: &Candidate, summary: &EvaluationSummary) {
        self.evaluated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((candidate.iteration_index, summary.accuracy));
    }

    fn on_iteration(&self, record: &IterationRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
    }

    fn on_complete(&self, _result: &OptimizationResult) {
        *self.completed.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}
