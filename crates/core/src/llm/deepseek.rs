use crate::config::Settings;
use crate::llm::error::ExternalError;
use crate::llm::{ChatPrompt, PredictionClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl DeepSeekClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout,
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_deepseek_api_key()?;
        let mut client = Self::new(api_key, settings.per_attempt_timeout())?;

        if let Ok(base_url) = std::env::var("DEEPSEEK_BASE_URL") {
            client.base_url = base_url;
        }
        if let Ok(model) = std::env::var("DEEPSEEK_MODEL") {
            client.model = model;
        }
        client.temperature = std::env::var("DEEPSEEK_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);
        client.max_tokens = std::env::var("DEEPSEEK_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap, ExternalError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ExternalError::Transport(format!("invalid API key header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    fn request_body(&self, prompt: &ChatPrompt) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: prompt.system.clone(),
                },
                Message {
                    role: "user",
                    content: prompt.user.clone(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ExternalError {
        if err.is_timeout() {
            ExternalError::Timeout {
                after: self.timeout,
            }
        } else {
            ExternalError::Transport(err.to_string())
        }
    }

    fn message_content(text: &str) -> Result<String, ExternalError> {
        let parsed = serde_json::from_str::<ChatCompletionResponse>(text)
            .map_err(|e| ExternalError::MalformedEnvelope(format!("{e}: {text}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ExternalError::MalformedEnvelope("missing choices[0].message.content".to_string())
            })
    }
}

#[async_trait::async_trait]
impl PredictionClient for DeepSeekClient {
    fn provider(&self) -> Provider {
        Provider::DeepSeek
    }

    async fn request_prediction(&self, prompt: &ChatPrompt) -> Result<String, ExternalError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(ExternalError::BadStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        Self::message_content(&text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
