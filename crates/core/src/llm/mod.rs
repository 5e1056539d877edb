pub mod deepseek;
pub mod error;
pub mod json;
pub mod prompt;
pub mod retry;

use crate::llm::error::ExternalError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    DeepSeek,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::DeepSeek => f.write_str("deepseek"),
        }
    }
}

/// A chat-style request: one system message and one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// One attempt against an external text-generation service.
///
/// Implementations make a single call and report its outcome; timeouts and
/// retries are applied by [`retry::request_with_retries`].
#[async_trait::async_trait]
pub trait PredictionClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn request_prediction(&self, prompt: &ChatPrompt) -> Result<String, ExternalError>;
}
