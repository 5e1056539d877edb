use crate::llm::Provider;
use std::fmt;
use std::time::Duration;

/// Why a single attempt against the external service produced no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalError {
    Timeout { after: Duration },
    Transport(String),
    BadStatus { status: u16, body: String },
    MalformedEnvelope(String),
}

impl ExternalError {
    pub fn stage(&self) -> &'static str {
        match self {
            ExternalError::Timeout { .. } => "timeout",
            ExternalError::Transport(_) => "transport",
            ExternalError::BadStatus { .. } => "http",
            ExternalError::MalformedEnvelope(_) => "envelope",
        }
    }
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalError::Timeout { after } => write!(f, "attempt timed out after {after:?}"),
            ExternalError::Transport(detail) => write!(f, "transport error: {detail}"),
            ExternalError::BadStatus { status, body } => {
                write!(f, "unexpected status {status}: {body}")
            }
            ExternalError::MalformedEnvelope(detail) => {
                write!(f, "malformed response envelope: {detail}")
            }
        }
    }
}

impl std::error::Error for ExternalError {}

/// Every attempt failed; carries the cause of the final one.
#[derive(Debug, Clone)]
pub struct RetriesExhausted {
    pub provider: Provider,
    pub attempts: u32,
    pub last: ExternalError,
}

impl fmt::Display for RetriesExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "external prediction failed (provider={}, attempts={}, stage={}): {}",
            self.provider,
            self.attempts,
            self.last.stage(),
            self.last
        )
    }
}

impl std::error::Error for RetriesExhausted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last)
    }
}
