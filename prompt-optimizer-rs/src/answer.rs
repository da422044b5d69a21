// prompt-optimizer-rs/src/answer.rs
// Answer evaluation strategies.
//
// Two interchangeable strategies behind one trait: normalized exact match for
// closed-label tasks, and an LLM rubric judgment for open-ended answers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use llm_client::{ChatMessage, CompletionClient, CompletionRequest, LlmError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EvaluationMode;
use crate::prompts;

/// The six-label rubric taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RubricLabel {
    Improvement,
    Degraded,
    #[serde(rename = "Information Gain")]
    InformationGain,
    #[serde(rename = "Information Gap")]
    InformationGap,
    Similar,
    Inadequate,
}

impl RubricLabel {
    pub const ALL: [RubricLabel; 6] = [
        RubricLabel::Improvement,
        RubricLabel::Degraded,
        RubricLabel::InformationGain,
        RubricLabel::InformationGap,
        RubricLabel::Similar,
        RubricLabel::Inadequate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RubricLabel::Improvement => "Improvement",
            RubricLabel::Degraded => "Degraded",
            RubricLabel::InformationGain => "Information Gain",
            RubricLabel::InformationGap => "Information Gap",
            RubricLabel::Similar => "Similar",
            RubricLabel::Inadequate => "Inadequate",
        }
    }

    /// Labels that count the new answer as correct.
    pub fn is_acceptable(&self) -> bool {
        matches!(
            self,
            RubricLabel::Improvement | RubricLabel::InformationGain | RubricLabel::Similar
        )
    }
}

impl fmt::Display for RubricLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RubricLabel {
    type Err = JudgmentParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let cleaned = raw.trim().trim_matches(|c| matches!(c, '`' | '\'' | '"')).trim();
        if cleaned.eq_ignore_ascii_case("similarity") {
            return Ok(RubricLabel::Similar);
        }
        RubricLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(cleaned))
            .ok_or_else(|| JudgmentParseError::UnknownLabel(raw.to_string()))
    }
}

/// The judge answered, but not in a form we can use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgmentParseError {
    #[error("judgment is not a JSON object: {0}")]
    MalformedJson(String),

    #[error("judgment is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("unrecognized judgment label: {0:?}")]
    UnknownLabel(String),
}

/// Failure of the evaluation path itself, as opposed to a wrong answer.
#[derive(Debug, Clone, Error)]
pub enum JudgmentError {
    #[error("judge call failed: {0}")]
    Service(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] JudgmentParseError),
}

/// Verdict for one answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Judgment {
    pub correct: bool,
    pub label: Option<RubricLabel>,
    pub analysis: Option<String>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    /// Whether reaching the verdict took a service call
    pub service_call: bool,
}

impl Judgment {
    fn verdict(correct: bool) -> Self {
        Self {
            correct,
            ..Self::default()
        }
    }
}

/// Strategy interface for answer evaluation.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    /// `actual` is `None` when no answer was produced; that is never correct.
    async fn evaluate(
        &self,
        question: &str,
        expected: &str,
        actual: Option<&str>,
    ) -> Result<Judgment, JudgmentError>;
}

pub(crate) fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed string equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatchEvaluator;

impl ExactMatchEvaluator {
    pub fn matches(expected: &str, actual: Option<&str>) -> bool {
        actual.is_some_and(|actual| normalize(expected) == normalize(actual))
    }
}

#[async_trait]
impl AnswerEvaluator for ExactMatchEvaluator {
    async fn evaluate(
        &self,
        _question: &str,
        expected: &str,
        actual: Option<&str>,
    ) -> Result<Judgment, JudgmentError> {
        Ok(Judgment::verdict(Self::matches(expected, actual)))
    }
}

#[derive(Debug, Deserialize)]
struct RawJudgment {
    analysis: Option<String>,
    result: Option<String>,
}

/// Parse the judge's JSON object into (analysis, label).
pub fn parse_judgment(text: &str) -> Result<(Option<String>, RubricLabel), JudgmentParseError> {
    let raw: RawJudgment =
        serde_json::from_str(text.trim()).map_err(|e| JudgmentParseError::MalformedJson(e.to_string()))?;
    let result = raw.result.ok_or(JudgmentParseError::MissingField("result"))?;
    let label = result.parse::<RubricLabel>()?;
    Ok((raw.analysis, label))
}

/// LLM judgment against the six-label rubric.
pub struct RubricEvaluator {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    model: Option<String>,
}

impl RubricEvaluator {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32, model: Option<String>) -> Self {
        Self {
            client,
            temperature,
            model,
        }
    }
}

#[async_trait]
impl AnswerEvaluator for RubricEvaluator {
    async fn evaluate(
        &self,
        question: &str,
        expected: &str,
        actual: Option<&str>,
    ) -> Result<Judgment, JudgmentError> {
        let Some(actual) = actual else {
            return Ok(Judgment::verdict(false));
        };

        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(prompts::JUDGE_SYSTEM),
                ChatMessage::user(prompts::judge_request(question, expected, actual)),
            ],
            self.temperature,
        )
        .structured()
        .with_model(self.model.clone());

        let completion = self.client.complete(request).await?;
        let (analysis, label) = parse_judgment(&completion.text)?;

        tracing::debug!(label = %label, "rubric judgment");

        Ok(Judgment {
            correct: label.is_acceptable(),
            label: Some(label),
            analysis,
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
            service_call: true,
        })
    }
}

/// Construct the strategy selected by the task configuration.
pub fn build_evaluator(
    mode: EvaluationMode,
    client: Arc<dyn CompletionClient>,
    judge_temperature: f32,
    model: Option<String>,
) -> Arc<dyn AnswerEvaluator> {
    match mode {
        EvaluationMode::ExactMatch => Arc::new(ExactMatchEvaluator),
        EvaluationMode::Rubric => Arc::new(RubricEvaluator::new(client, judge_temperature, model)),
    }
}
