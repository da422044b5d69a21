use llm_client::{Completion, LlmError};

use super::stub::{reflection_response, stub};
use crate::model::{Candidate, CaseResult};
use crate::reflector::{parse_reflection, Reflector};

fn case_result(index: usize, input: &str, expected: &str, actual: &str) -> CaseResult {
    CaseResult {
        index,
        input: input.into(),
        expected: expected.to_string(),
        actual: Some(actual.to_string()),
        correct: expected.eq_ignore_ascii_case(actual),
        response_time: 0.4,
        evaluation_time: Some(0.0),
        response_prompt_tokens: None,
        response_completion_tokens: None,
        evaluation_prompt_tokens: None,
        evaluation_completion_tokens: None,
        judgment: None,
        analysis: None,
        failure: None,
    }
}

fn results() -> Vec<CaseResult> {
    vec![
        case_result(0, "Where is my parcel?!", "Complaint", "Question"),
        case_result(1, "What time do you open?", "Question", "Question"),
    ]
}

#[test]
fn parse_reflection_splits_on_markers() {
    let response = "Some preamble.\nREFLECTION:\nThe prompt never defines Complaint.\n\nIMPROVED PROMPT:\nClassify the email as Complaint, Question or Praise.\n";
    let (reflection, prompt) = parse_reflection(response).unwrap();
    assert_eq!(reflection, "The prompt never defines Complaint.");
    assert_eq!(prompt, "Classify the email as Complaint, Question or Praise.");
}

#[test]
fn parse_reflection_rejects_missing_misordered_or_empty_sections() {
    assert!(parse_reflection("REFLECTION: fine as is").is_none());
    assert!(parse_reflection("IMPROVED PROMPT: new prompt").is_none());
    assert!(parse_reflection("IMPROVED PROMPT: new prompt\nREFLECTION: critique").is_none());
    assert!(parse_reflection("REFLECTION: critique\nIMPROVED PROMPT:   \n").is_none());
}

#[tokio::test]
async fn reflect_returns_parsed_sections() {
    let client = stub(|_| {
        Ok(Completion::text(reflection_response("Too vague.", "Be specific.")).with_usage(300, 60))
    });
    let reflector = Reflector::new(client.clone(), Some("Classify support emails.".to_string()), None);

    let reflection = reflector
        .reflect(&Candidate::seed("Classify."), &results(), 50.0, 1.0)
        .await;

    assert!(reflection.parsed);
    assert_eq!(reflection.text, "Too vague.");
    assert_eq!(reflection.improved_prompt, "Be specific.");
    assert_eq!(reflection.prompt_tokens, Some(300));

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].temperature, 1.0);
    let request = &calls[0].messages[0].content;
    assert!(request.contains("Task: Classify support emails."));
    assert!(request.contains("\"Classify.\""));
    assert!(request.contains("50.00%"));
    // Both failing and passing cases are shown.
    assert!(request.contains("Where is my parcel?!"));
    assert!(request.contains("What time do you open?"));
    assert!(request.contains("\"is_correct\": true"));
    assert!(request.contains("\"is_correct\": false"));
    let reflection_at = request.rfind("REFLECTION:").unwrap();
    let prompt_at = request.rfind("IMPROVED PROMPT:").unwrap();
    assert!(reflection_at < prompt_at);
}

#[tokio::test]
async fn missing_markers_fall_back_to_raw_response() {
    let raw = "The prompt is fine, keep it.";
    let client = stub(move |_| Ok(Completion::text(raw)));
    let reflector = Reflector::new(client, None, None);
    let candidate = Candidate::seed("Classify the email.");

    let reflection = reflector.reflect(&candidate, &results(), 50.0, 1.0).await;

    assert!(!reflection.parsed);
    assert_eq!(reflection.text, raw);
    assert_eq!(reflection.improved_prompt, candidate.prompt_text);
}

#[tokio::test]
async fn service_failure_keeps_the_prompt() {
    let client = stub(|_| Err(LlmError::RateLimited("slow down".to_string())));
    let reflector = Reflector::new(client, None, None);
    let candidate = Candidate::seed("Classify the email.");

    let reflection = reflector.reflect(&candidate, &results(), 50.0, 1.0).await;

    assert!(!reflection.parsed);
    assert!(reflection.text.starts_with("<reflection unavailable:"));
    assert!(reflection.text.contains("slow down"));
    assert_eq!(reflection.improved_prompt, "Classify the email.");
}
