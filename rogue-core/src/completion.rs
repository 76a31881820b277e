//! Text-completion capability.
//!
//! Character generation and conversation only ever need "prompt in, text
//! out". The trait keeps the rest of the engine independent of the
//! Claude client so tests and offline play can swap it out.

use async_trait::async_trait;
use claude::{Claude, Message, Request};
use thiserror::Error;
use tracing::debug;

/// Errors from a text-completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Claude API error: {0}")]
    Client(#[from] claude::Error),

    #[error("Text completion unavailable: {0}")]
    Unavailable(String),

    #[error("Text completion returned no text")]
    Empty,
}

/// Something that turns a prompt into generated text.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Completion backed by the Claude Messages API.
#[derive(Clone)]
pub struct ClaudeCompletion {
    client: Claude,
    max_tokens: usize,
    temperature: Option<f32>,
}

impl ClaudeCompletion {
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            max_tokens: 1024,
            temperature: Some(0.9),
        }
    }

    /// Build from `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self, CompletionError> {
        Ok(Self::new(Claude::from_env()?))
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl TextCompletion for ClaudeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let mut request = Request::new(vec![Message::user(prompt)]).with_max_tokens(self.max_tokens);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self.client.complete(request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Claude completion finished"
        );

        let text = response.into_text();
        if text.trim().is_empty() {
            return Err(CompletionError::Empty);
        }
        Ok(text)
    }
}

/// A completion source that always fails.
///
/// Used when no API key is configured: every generation falls back to the
/// default characters and the game stays playable without a network.
#[derive(Debug, Clone, Default)]
pub struct OfflineCompletion;

#[async_trait]
impl TextCompletion for OfflineCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Unavailable("offline mode".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_always_fails() {
        let offline = OfflineCompletion;
        let err = offline.complete("hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Unavailable(_)));
    }

    #[test]
    fn test_claude_completion_builder() {
        let completion = ClaudeCompletion::new(Claude::new("test-key"))
            .with_max_tokens(256)
            .with_temperature(None);
        assert_eq!(completion.max_tokens, 256);
        assert!(completion.temperature.is_none());
    }
}
