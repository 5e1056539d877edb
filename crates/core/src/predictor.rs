use crate::config::Settings;
use crate::domain::fortune::{FortuneSequence, PredictionRequest};
use crate::generator;
use crate::llm::deepseek::DeepSeekClient;
use crate::llm::retry::{self, RetryPolicy};
use crate::llm::{json, prompt, PredictionClient};
use crate::numerology;
use crate::storage::ResultCache;
use crate::time::forecast::{self, ForecastWindow};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum PredictError {
    /// Empty name or unparseable birthdate.
    InvalidInput(String),
    Internal(anyhow::Error),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::InvalidInput(detail) => write!(f, "invalid input: {detail}"),
            PredictError::Internal(err) => write!(f, "internal error: {err:#}"),
        }
    }
}

impl std::error::Error for PredictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PredictError::InvalidInput(_) => None,
            PredictError::Internal(err) => Some(&**err),
        }
    }
}

/// Where forecasts come from on a cache miss.
#[derive(Clone)]
pub enum Source {
    /// Deterministic generator only; the external service is never called.
    Mock,
    External(Arc<dyn PredictionClient>),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Mock => f.write_str("Mock"),
            Source::External(client) => write!(f, "External({})", client.provider()),
        }
    }
}

#[derive(Debug)]
pub struct FortunePredictor {
    source: Source,
    retry: RetryPolicy,
    cache: ResultCache,
    utc_offset_hours: Option<i32>,
}

impl FortunePredictor {
    pub fn new(source: Source, retry: RetryPolicy, cache: ResultCache) -> Self {
        Self {
            source,
            retry,
            cache,
            utc_offset_hours: None,
        }
    }

    /// Mock mode when configured, or when no API key is available.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let source = if settings.mock_mode {
            Source::Mock
        } else if settings.deepseek_api_key.is_none() {
            tracing::warn!("DEEPSEEK_API_KEY missing; serving generated forecasts only");
            Source::Mock
        } else {
            Source::External(Arc::new(DeepSeekClient::from_settings(settings)?))
        };

        Ok(Self {
            source,
            retry: RetryPolicy::from_settings(settings),
            cache: ResultCache::new(settings.cache_ttl()),
            utc_offset_hours: settings.utc_offset_hours,
        })
    }

    pub fn with_utc_offset_hours(mut self, hours: Option<i32>) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub async fn predict(
        &self,
        name: &str,
        birthdate: &str,
    ) -> Result<FortuneSequence, PredictError> {
        let today = forecast::resolve_today(self.utc_offset_hours, chrono::Utc::now())
            .map_err(PredictError::Internal)?;
        self.predict_on(name, birthdate, today).await
    }

    /// Like [`Self::predict`], with the forecast starting on `today`.
    pub async fn predict_on(
        &self,
        name: &str,
        birthdate: &str,
        today: NaiveDate,
    ) -> Result<FortuneSequence, PredictError> {
        let request = PredictionRequest::parse(name, birthdate)
            .map_err(|e| PredictError::InvalidInput(format!("{e:#}")))?;
        let fingerprint = request.fingerprint();

        match self.cache.get(&fingerprint).map_err(PredictError::Internal)? {
            Some(hit) if hit.first_date() == today => {
                tracing::debug!(%fingerprint, "fortune cache hit");
                return Ok(hit);
            }
            // Computed on an earlier day; recompute and overwrite below.
            Some(stale) => {
                tracing::debug!(
                    %fingerprint,
                    cached_start = %stale.first_date(),
                    %today,
                    "stale fortune cache entry"
                );
            }
            None => {}
        }

        let seed = numerology::seed(request.birthdate);
        let window = ForecastWindow::starting(today);

        let raw = match &self.source {
            Source::Mock => None,
            Source::External(client) => {
                let prompt = prompt::build(&request.name, request.birthdate, seed, &window);
                match retry::request_with_retries(client.as_ref(), &self.retry, &prompt).await {
                    Ok(text) => Some(text),
                    Err(err) => {
                        tracing::warn!(
                            %fingerprint,
                            error = %err,
                            "falling back to generated forecast"
                        );
                        None
                    }
                }
            }
        };

        let sequence = match raw {
            Some(text) => json::parse_and_validate(&text, &window, &request.name, seed),
            None => generator::generate_sequence(&window, &request.name, seed),
        };

        self.cache
            .put(fingerprint.clone(), sequence.clone())
            .map_err(PredictError::Internal)?;
        tracing::info!(%fingerprint, start = %window.start(), seed, "fortune computed");
        Ok(sequence)
    }
}
