//! # LLM Client
//!
//! The text completion capability every other component of the optimizer
//! depends on.
//!
//! This crate provides:
//!
//! - `CompletionClient`: the async contract (role-tagged messages plus
//!   temperature and a structured-output flag in, generated text plus
//!   optional token counts out)
//! - `OpenAiCompletionClient`: an implementation against any
//!   OpenAI-compatible chat completions endpoint
//! - `LlmError`: categorized failures with a retryable/non-retryable split
//!
//! Clients never retry on their own. Retry policy belongs to the caller.

use std::sync::Arc;

use async_trait::async_trait;

pub mod config;
pub mod error;
pub mod message;
pub mod openai;

#[cfg(test)]
mod tests;

pub use config::LlmConfig;
pub use error::{LlmError, Result};
pub use message::{ChatMessage, Completion, CompletionRequest, Role};
pub use openai::OpenAiCompletionClient;

/// A text-generation capability.
///
/// An `Err` is the explicit "absent result": implementations must report
/// remote failures, timeouts and empty content as errors instead of
/// panicking, and callers must check for them before using the text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}

#[async_trait]
impl<T> CompletionClient for Arc<T>
where
    T: CompletionClient + ?Sized,
{
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        (**self).complete(request).await
    }
}
