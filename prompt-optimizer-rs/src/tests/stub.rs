// prompt-optimizer-rs/src/tests/stub.rs
// Scripted CompletionClient used in place of a real service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llm_client::{Completion, CompletionClient, CompletionRequest, LlmError, Role};

use crate::model::TestCase;
use crate::prompts::{IMPROVED_PROMPT_MARKER, JUDGE_SYSTEM};

type Handler = dyn Fn(&CompletionRequest) -> Result<Completion, LlmError> + Send + Sync;
type DelayFn = dyn Fn(&CompletionRequest) -> Duration + Send + Sync;

/// What a request was for, recovered from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Seed,
    Response,
    Judge,
    Reflection,
}

pub(crate) fn classify(request: &CompletionRequest) -> CallKind {
    let first = &request.messages[0];
    match first.role {
        Role::System if first.content == JUDGE_SYSTEM => CallKind::Judge,
        Role::System => CallKind::Response,
        _ if first.content.contains(IMPROVED_PROMPT_MARKER) => CallKind::Reflection,
        _ => CallKind::Seed,
    }
}

/// The system prompt and user input of a response call.
pub(crate) fn response_parts(request: &CompletionRequest) -> (&str, &str) {
    (
        request.messages[0].content.as_str(),
        request.messages[1].content.as_str(),
    )
}

pub(crate) struct StubClient {
    handler: Box<Handler>,
    delay: Option<Box<DelayFn>>,
    calls: Mutex<Vec<CompletionRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubClient {
    pub(crate) fn new(
        handler: impl Fn(&CompletionRequest) -> Result<Completion, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: impl Fn(&CompletionRequest) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, kind: CallKind) -> usize {
        self.calls().iter().filter(|r| classify(r) == kind).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        self.calls.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(&request)).await;
        }
        let result = (self.handler)(&request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub(crate) fn stub(
    handler: impl Fn(&CompletionRequest) -> Result<Completion, LlmError> + Send + Sync + 'static,
) -> Arc<StubClient> {
    Arc::new(StubClient::new(handler))
}

/// Four single-label classification cases.
pub(crate) fn classification_cases() -> Vec<TestCase> {
    vec![
        TestCase::new("My package never arrived and I want a refund.", "Complaint"),
        TestCase::new("What are your opening hours?", "Question"),
        TestCase::new("Your support team was wonderful, thank you!", "Praise"),
        TestCase::new("How do I reset my password?", "Question"),
    ]
}

/// Correct label for one of `classification_cases`, by input.
pub(crate) fn label_for(input: &str) -> &'static str {
    if input.contains("refund") {
        "Complaint"
    } else if input.contains("wonderful") {
        "Praise"
    } else {
        "Question"
    }
}

pub(crate) fn reflection_response(critique: &str, improved: &str) -> String {
    format!("REFLECTION:\n{}\n\nIMPROVED PROMPT:\n{}", critique, improved)
}
