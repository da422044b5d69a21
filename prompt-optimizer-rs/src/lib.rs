// prompt-optimizer-rs/src/lib.rs
// Library interface for the reflective prompt optimizer.
//
// Given a labeled test set, the optimizer seeds a candidate system prompt,
// scores it, asks the model to critique its own failures and rewrite the
// prompt, and repeats until an accuracy threshold or an iteration budget is
// reached.
//
// Design notes:
// - The completion client is injected by the caller and shared by every
//   collaborator; there is no global client or configuration.
// - Service failures are contained at the smallest scope (a case, a
//   reflection step). Only precondition violations, seed generation failure
//   and early cancellation end a run with an error.
// - Presentation is left to observers and the row types in `export`.

pub mod answer;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod initial_prompt;
pub mod model;
pub mod observer;
pub mod optimizer;
pub mod reflector;
pub mod retry;

mod prompts;

#[cfg(test)]
mod tests;

pub use answer::{
    build_evaluator, parse_judgment, AnswerEvaluator, ExactMatchEvaluator, Judgment, JudgmentError,
    JudgmentParseError, RubricEvaluator, RubricLabel,
};
pub use config::{EvaluationMode, OptimizerConfig};
pub use error::{OptimizerError, Result};
pub use evaluation::{validate_test_cases, EvaluationSummary, EvaluatorSettings, PromptEvaluator};
pub use export::{CaseRow, HistoryRow, RunReport};
pub use initial_prompt::InitialPromptGenerator;
pub use model::{
    Candidate, CaseFailure, CaseResult, IterationRecord, IterationTimings, OptimizationResult, StopReason,
    TestCase, TokenUsage,
};
pub use observer::{CollectingObserver, IterationObserver, LoggingObserver};
pub use optimizer::{CancellationFlag, PromptOptimizer};
pub use reflector::{parse_reflection, Reflection, Reflector};
pub use retry::{RetryPolicy, RetryingClient};
