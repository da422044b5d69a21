// prompt-optimizer-rs/src/error.rs
// Fatal error taxonomy for an optimization run.
//
// Per-call service failures are not represented here: they are contained
// at the case, reflection or retry level and surface only in diagnostics.
// The one exception is the seed step, which has nothing to fall back to.

use thiserror::Error;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, OptimizerError>;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("test set is empty; accuracy is undefined")]
    EmptyTestSet,

    #[error("test case #{index} is invalid: {reason}")]
    InvalidTestCase { index: usize, reason: String },

    #[error("failed to generate the initial prompt: {0}")]
    InitGeneration(String),

    #[error("optimization cancelled before the first evaluation")]
    Cancelled,
}
