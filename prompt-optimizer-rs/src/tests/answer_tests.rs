use llm_client::{Completion, LlmError};

use super::stub::{stub, CallKind};
use crate::answer::{
    build_evaluator, parse_judgment, AnswerEvaluator, ExactMatchEvaluator, JudgmentError, JudgmentParseError,
    RubricEvaluator, RubricLabel,
};
use crate::config::EvaluationMode;

#[tokio::test]
async fn exact_match_ignores_case_and_surrounding_whitespace() {
    let evaluator = ExactMatchEvaluator;

    let judgment = evaluator.evaluate("", "Complaint", Some("complaint")).await.unwrap();
    assert!(judgment.correct);

    let judgment = evaluator.evaluate("", "Complaint", Some("  COMPLAINT\n")).await.unwrap();
    assert!(judgment.correct);

    let judgment = evaluator.evaluate("", "Complaint", Some("Question")).await.unwrap();
    assert!(!judgment.correct);
    assert!(judgment.label.is_none());
    assert!(!judgment.service_call);
}

#[test]
fn exact_match_absent_answer_is_incorrect() {
    assert!(!ExactMatchEvaluator::matches("Complaint", None));
    assert!(!ExactMatchEvaluator::matches("Complaint", Some("")));
}

#[test]
fn rubric_labels_parse_leniently() {
    assert_eq!("Improvement".parse::<RubricLabel>().unwrap(), RubricLabel::Improvement);
    assert_eq!("`Information Gain`".parse::<RubricLabel>().unwrap(), RubricLabel::InformationGain);
    assert_eq!(" information gap ".parse::<RubricLabel>().unwrap(), RubricLabel::InformationGap);
    assert_eq!("\"Similarity\"".parse::<RubricLabel>().unwrap(), RubricLabel::Similar);
    assert!(matches!(
        "Better".parse::<RubricLabel>(),
        Err(JudgmentParseError::UnknownLabel(label)) if label == "Better"
    ));
}

#[test]
fn only_three_labels_count_as_correct() {
    let acceptable: Vec<RubricLabel> = RubricLabel::ALL.into_iter().filter(|l| l.is_acceptable()).collect();
    assert_eq!(
        acceptable,
        vec![RubricLabel::Improvement, RubricLabel::InformationGain, RubricLabel::Similar]
    );
}

#[test]
fn parse_judgment_reports_each_failure_kind() {
    let (analysis, label) =
        parse_judgment(r#"{"analysis": "Both answers cite the same policy.", "result": "Similar"}"#).unwrap();
    assert_eq!(analysis.as_deref(), Some("Both answers cite the same policy."));
    assert_eq!(label, RubricLabel::Similar);

    assert!(matches!(parse_judgment("Similar"), Err(JudgmentParseError::MalformedJson(_))));
    assert_eq!(
        parse_judgment(r#"{"analysis": "no verdict"}"#),
        Err(JudgmentParseError::MissingField("result"))
    );
    assert!(matches!(
        parse_judgment(r#"{"result": "Excellent"}"#),
        Err(JudgmentParseError::UnknownLabel(_))
    ));
}

#[tokio::test]
async fn rubric_judgment_requests_structured_output() {
    let client = stub(|_| {
        Ok(Completion::text(r#"{"analysis": "More detailed.", "result": "Information Gain"}"#).with_usage(120, 18))
    });
    let evaluator = RubricEvaluator::new(client.clone(), 1.0, Some("judge-model".to_string()));

    let judgment = evaluator
        .evaluate("Who wrote the report?", "The audit team.", Some("The 2023 audit team, led by R. Ames."))
        .await
        .unwrap();

    assert!(judgment.correct);
    assert_eq!(judgment.label, Some(RubricLabel::InformationGain));
    assert_eq!(judgment.analysis.as_deref(), Some("More detailed."));
    assert_eq!(judgment.prompt_tokens, Some(120));
    assert_eq!(judgment.completion_tokens, Some(18));
    assert!(judgment.service_call);

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].expect_structured);
    assert_eq!(calls[0].model.as_deref(), Some("judge-model"));
    assert_eq!(client.count(CallKind::Judge), 1);
    let user = &calls[0].messages[1].content;
    assert!(user.contains("Who wrote the report?"));
    assert!(user.contains("The audit team."));
    assert!(user.contains("The 2023 audit team, led by R. Ames."));
}

#[tokio::test]
async fn rubric_degraded_answer_is_incorrect() {
    let client = stub(|_| Ok(Completion::text(r#"{"analysis": "Refused.", "result": "Degraded"}"#)));
    let evaluator = RubricEvaluator::new(client, 1.0, None);

    let judgment = evaluator.evaluate("q", "An answer.", Some("I don't know.")).await.unwrap();
    assert!(!judgment.correct);
    assert_eq!(judgment.label, Some(RubricLabel::Degraded));
}

#[tokio::test]
async fn rubric_absent_answer_skips_the_judge() {
    let client = stub(|_| panic!("judge must not be called"));
    let evaluator = RubricEvaluator::new(client.clone(), 1.0, None);

    let judgment = evaluator.evaluate("q", "expected", None).await.unwrap();
    assert!(!judgment.correct);
    assert!(!judgment.service_call);
    assert_eq!(client.total_calls(), 0);
}

#[tokio::test]
async fn rubric_surfaces_unknown_labels_and_service_failures() {
    let client = stub(|_| Ok(Completion::text(r#"{"analysis": "?", "result": "Excellent"}"#)));
    let evaluator = RubricEvaluator::new(client, 1.0, None);
    let err = evaluator.evaluate("q", "a", Some("b")).await.unwrap_err();
    assert!(matches!(err, JudgmentError::Parse(JudgmentParseError::UnknownLabel(_))));

    let client = stub(|_| Err(LlmError::Server("503".to_string())));
    let evaluator = RubricEvaluator::new(client, 1.0, None);
    let err = evaluator.evaluate("q", "a", Some("b")).await.unwrap_err();
    assert!(matches!(err, JudgmentError::Service(LlmError::Server(_))));
}

#[tokio::test]
async fn build_evaluator_selects_strategy_by_mode() {
    let client = stub(|_| Ok(Completion::text(r#"{"analysis": "", "result": "Similar"}"#)));

    let exact = build_evaluator(EvaluationMode::ExactMatch, client.clone(), 1.0, None);
    assert!(!exact.evaluate("q", "yes", Some("no")).await.unwrap().correct);
    assert_eq!(client.total_calls(), 0);

    let rubric = build_evaluator(EvaluationMode::Rubric, client.clone(), 1.0, None);
    assert!(rubric.evaluate("q", "yes", Some("no")).await.unwrap().correct);
    assert_eq!(client.total_calls(), 1);
}
