use crate::config::Settings;
use crate::llm::error::{ExternalError, RetriesExhausted};
use crate::llm::{ChatPrompt, PredictionClient};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub per_attempt_timeout: Duration,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.max_retries.max(1),
            per_attempt_timeout: settings.per_attempt_timeout(),
            backoff_base: settings.backoff_base(),
        }
    }

    /// Wait after the 1-based `attempt` failed: `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.min(20)))
    }
}

enum Attempt {
    Success(String),
    RetryableFailure(ExternalError),
    TerminalFailure(ExternalError),
}

async fn attempt_once(
    client: &dyn PredictionClient,
    policy: &RetryPolicy,
    prompt: &ChatPrompt,
    attempt: u32,
) -> Attempt {
    let outcome = tokio::time::timeout(policy.per_attempt_timeout, client.request_prediction(prompt))
        .await
        .unwrap_or(Err(ExternalError::Timeout {
            after: policy.per_attempt_timeout,
        }));

    match outcome {
        Ok(text) => Attempt::Success(text),
        Err(err) if attempt < policy.max_attempts => Attempt::RetryableFailure(err),
        Err(err) => Attempt::TerminalFailure(err),
    }
}

/// Calls the external service until one attempt succeeds or the policy is exhausted.
///
/// Each attempt is bounded by `per_attempt_timeout`. Dropping the returned
/// future cancels the attempt in flight.
pub async fn request_with_retries(
    client: &dyn PredictionClient,
    policy: &RetryPolicy,
    prompt: &ChatPrompt,
) -> Result<String, RetriesExhausted> {
    let provider = client.provider();
    let mut attempt: u32 = 1;
    loop {
        match attempt_once(client, policy, prompt, attempt).await {
            Attempt::Success(text) => {
                tracing::info!(
                    %provider,
                    attempt,
                    bytes = text.len(),
                    "external prediction succeeded"
                );
                return Ok(text);
            }
            Attempt::RetryableFailure(err) => {
                let backoff = policy.backoff(attempt);
                tracing::warn!(
                    %provider,
                    attempt,
                    stage = err.stage(),
                    ?backoff,
                    error = %err,
                    "external prediction failed; retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Attempt::TerminalFailure(err) => {
                tracing::warn!(
                    %provider,
                    attempt,
                    stage = err.stage(),
                    error = %err,
                    "external prediction failed; giving up"
                );
                return Err(RetriesExhausted {
                    provider,
                    attempts: attempt,
                    last: err,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct Scripted {
        calls: AtomicU32,
        script: Mutex<Vec<Result<String, ExternalError>>>,
    }

    impl Scripted {
        fn new(mut script: Vec<Result<String, ExternalError>>) -> Self {
            script.reverse();
            Self {
                calls: AtomicU32::new(0),
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait::async_trait]
    impl PredictionClient for Scripted {
        fn provider(&self) -> Provider {
            Provider::DeepSeek
        }

        async fn request_prediction(&self, _prompt: &ChatPrompt) -> Result<String, ExternalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop();
            next.unwrap_or_else(|| Err(ExternalError::Transport("script exhausted".to_string())))
        }
    }

    struct Hangs {
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl PredictionClient for Hangs {
        fn provider(&self) -> Provider {
            Provider::DeepSeek
        }

        async fn request_prediction(&self, _prompt: &ChatPrompt) -> Result<String, ExternalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            per_attempt_timeout: Duration::from_millis(20),
            backoff_base: Duration::from_millis(1),
        }
    }

    fn prompt() -> ChatPrompt {
        ChatPrompt {
            system: "s".to_string(),
            user: "u".to_string(),
        }
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let client = Scripted::new(vec![
            Err(ExternalError::BadStatus {
                status: 503,
                body: String::new(),
            }),
            Err(ExternalError::MalformedEnvelope("no choices".to_string())),
            Ok("[]".to_string()),
        ]);
        let text = request_with_retries(&client, &fast_policy(), &prompt())
            .await
            .unwrap();
        assert_eq!(text, "[]");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_last_cause_after_final_attempt() {
        let client = Scripted::new(vec![
            Err(ExternalError::Transport("refused".to_string())),
            Err(ExternalError::Transport("refused".to_string())),
            Err(ExternalError::BadStatus {
                status: 500,
                body: "boom".to_string(),
            }),
            Ok("never reached".to_string()),
        ]);
        let err = request_with_retries(&client, &fast_policy(), &prompt())
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last.stage(), "http");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn hung_attempts_are_cut_off_by_timeout() {
        let client = Hangs {
            calls: AtomicU32::new(0),
        };
        let err = request_with_retries(&client, &fast_policy(), &prompt())
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 3);
        assert!(matches!(err.last, ExternalError::Timeout { .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_attempt_policy_does_not_retry() {
        let client = Scripted::new(vec![Err(ExternalError::Transport("down".to_string()))]);
        let policy = RetryPolicy {
            max_attempts: 1,
            ..fast_policy()
        };
        let err = request_with_retries(&client, &policy, &prompt())
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
