pub mod domain;
pub mod generator;
pub mod llm;
pub mod numerology;
pub mod predictor;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;
    const DEFAULT_MAX_RETRIES: u32 = 3;
    const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 10_000;
    const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub deepseek_api_key: Option<String>,
        pub mock_mode: bool,
        pub cache_ttl_secs: u64,
        /// Total attempts against the external service, including the first one.
        pub max_retries: u32,
        pub per_attempt_timeout_ms: u64,
        pub backoff_base_ms: u64,
        pub utc_offset_hours: Option<i32>,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                deepseek_api_key: None,
                mock_mode: false,
                cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
                max_retries: DEFAULT_MAX_RETRIES,
                per_attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
                backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
                utc_offset_hours: None,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let utc_offset_hours = match std::env::var("FORTUNE_UTC_OFFSET_HOURS") {
                Ok(s) if !s.trim().is_empty() => {
                    let hours = s
                        .trim()
                        .parse::<i32>()
                        .with_context(|| format!("FORTUNE_UTC_OFFSET_HOURS is not an integer: {s}"))?;
                    anyhow::ensure!(
                        (-23..=23).contains(&hours),
                        "FORTUNE_UTC_OFFSET_HOURS must be within -23..=23 (got {hours})"
                    );
                    Some(hours)
                }
                _ => None,
            };

            Ok(Self {
                deepseek_api_key: std::env::var("DEEPSEEK_API_KEY")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                mock_mode: std::env::var("USE_MOCK_DATA")
                    .map(|s| parse_flag(&s))
                    .unwrap_or(false),
                cache_ttl_secs: env_or("FORTUNE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
                max_retries: env_or("FORTUNE_MAX_RETRIES", DEFAULT_MAX_RETRIES).max(1),
                per_attempt_timeout_ms: env_or(
                    "FORTUNE_ATTEMPT_TIMEOUT_MS",
                    DEFAULT_ATTEMPT_TIMEOUT_MS,
                ),
                backoff_base_ms: env_or("FORTUNE_BACKOFF_BASE_MS", DEFAULT_BACKOFF_BASE_MS),
                utc_offset_hours,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_deepseek_api_key(&self) -> anyhow::Result<&str> {
            self.deepseek_api_key
                .as_deref()
                .context("DEEPSEEK_API_KEY is required")
        }

        pub fn cache_ttl(&self) -> Duration {
            Duration::from_secs(self.cache_ttl_secs)
        }

        pub fn per_attempt_timeout(&self) -> Duration {
            Duration::from_millis(self.per_attempt_timeout_ms)
        }

        pub fn backoff_base(&self) -> Duration {
            Duration::from_millis(self.backoff_base_ms)
        }
    }

    fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
            .unwrap_or(default)
    }

    fn parse_flag(s: &str) -> bool {
        matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
    }

}
