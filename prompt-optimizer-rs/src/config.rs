// prompt-optimizer-rs/src/config.rs
// Tunable parameters for one optimization run.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};
use crate::retry::RetryPolicy;

/// Answer evaluation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Normalized string equality; suits classification tasks
    #[default]
    ExactMatch,
    /// Six-label LLM judgment; suits open-ended answers
    Rubric,
}

impl FromStr for EvaluationMode {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "exact_match" | "exact-match" => Ok(EvaluationMode::ExactMatch),
            "rubric" | "judge" => Ok(EvaluationMode::Rubric),
            other => Err(OptimizerError::InvalidConfiguration(format!(
                "evaluation_mode must be `exact` or `rubric`, got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationMode::ExactMatch => f.write_str("exact"),
            EvaluationMode::Rubric => f.write_str("rubric"),
        }
    }
}

/// Configuration for the optimization loop.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Iteration budget, >= 1
    pub max_iterations: u32,
    /// Stop once accuracy (percent) reaches this, in (0, 100]
    pub accuracy_threshold: f64,
    pub reflection_temperature: f32,
    /// Temperature for generating the seed prompt
    pub seed_temperature: f32,
    /// Temperature for answering test cases
    pub response_temperature: f32,
    /// Temperature for the rubric judge
    pub judge_temperature: f32,
    /// Model override for every call; the client's default when unset
    pub model: Option<String>,
    /// Used as the iteration-1 prompt instead of generating one
    pub starter_prompt: Option<String>,
    pub evaluation_mode: EvaluationMode,
    /// Test cases evaluated concurrently, >= 1
    pub max_concurrency: usize,
    /// Per-attempt deadline for every completion call
    pub request_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            accuracy_threshold: 95.0,
            reflection_temperature: 1.0,
            seed_temperature: 0.7,
            response_temperature: 0.0,
            judge_temperature: 1.0,
            model: None,
            starter_prompt: None,
            evaluation_mode: EvaluationMode::ExactMatch,
            max_concurrency: 1,
            request_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl OptimizerConfig {
    /// Construct configuration from environment variables.
    ///
    /// Unparsable values fall back to defaults with a warning; range checks
    /// happen in `validate`, which the optimizer runs before every run.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let evaluation_mode = match config_rs::env_opt("OPTIMIZER_EVALUATION_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.evaluation_mode,
        };

        let retry = RetryPolicy {
            max_retries: config_rs::env_or("OPTIMIZER_MAX_RETRIES", defaults.retry.max_retries),
            initial_delay: Duration::from_millis(config_rs::env_or(
                "OPTIMIZER_INITIAL_RETRY_DELAY_MS",
                defaults.retry.initial_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(config_rs::env_or(
                "OPTIMIZER_MAX_RETRY_DELAY_MS",
                defaults.retry.max_delay.as_millis() as u64,
            )),
        };

        Ok(Self {
            max_iterations: config_rs::env_or("OPTIMIZER_MAX_ITERATIONS", defaults.max_iterations),
            accuracy_threshold: config_rs::env_or(
                "OPTIMIZER_ACCURACY_THRESHOLD",
                defaults.accuracy_threshold,
            ),
            reflection_temperature: config_rs::env_or(
                "OPTIMIZER_REFLECTION_TEMPERATURE",
                defaults.reflection_temperature,
            ),
            seed_temperature: config_rs::env_or("OPTIMIZER_SEED_TEMPERATURE", defaults.seed_temperature),
            response_temperature: config_rs::env_or(
                "OPTIMIZER_RESPONSE_TEMPERATURE",
                defaults.response_temperature,
            ),
            judge_temperature: config_rs::env_or("OPTIMIZER_JUDGE_TEMPERATURE", defaults.judge_temperature),
            model: config_rs::env_opt("OPTIMIZER_MODEL"),
            starter_prompt: config_rs::env_opt("OPTIMIZER_STARTER_PROMPT"),
            evaluation_mode,
            max_concurrency: config_rs::env_or("OPTIMIZER_MAX_CONCURRENCY", defaults.max_concurrency),
            request_timeout: config_rs::env_parse::<u64>("OPTIMIZER_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs),
            retry,
        })
    }

    /// Check the loop's preconditions.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations < 1 {
            return Err(invalid(format!(
                "max_iterations must be at least 1, got {}",
                self.max_iterations
            )));
        }
        if !(self.accuracy_threshold > 0.0 && self.accuracy_threshold <= 100.0) {
            return Err(invalid(format!(
                "accuracy_threshold must be in (0, 100], got {}",
                self.accuracy_threshold
            )));
        }
        for (name, value) in [
            ("reflection_temperature", self.reflection_temperature),
            ("seed_temperature", self.seed_temperature),
            ("response_temperature", self.response_temperature),
            ("judge_temperature", self.judge_temperature),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{} must be a non-negative number, got {}", name, value)));
            }
        }
        if self.max_concurrency < 1 {
            return Err(invalid("max_concurrency must be at least 1, got 0".to_string()));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(invalid("request_timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> OptimizerError {
    OptimizerError::InvalidConfiguration(message)
}
