use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::Duration;

use crate::history::DEFAULT_MAX_HISTORY;

const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";

/// One week.
const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;
/// One year.
const MAX_VALIDITY_HOURS: i64 = 365 * 24;
const MAX_HISTORY_ENTRIES: usize = 100;

/// Where gate, throttle, and history state is persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    File(PathBuf),
    Redis(String),
    Memory,
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    /// Optional; no `Authorization` header is sent when absent.
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Application configuration loaded from environment variables.
/// Nothing is required; every option has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub entitlement_validity: Duration,
    pub history_max_entries: usize,
    pub payment_price: f64,
    pub payment_currency: String,
    pub storage_backend: StorageBackend,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            llm: LlmConfig {
                api_url: DEFAULT_LLM_API_URL.to_string(),
                api_key: None,
                model: DEFAULT_LLM_MODEL.to_string(),
                max_tokens: 1000,
                temperature: 0.7,
                timeout_secs: 60,
            },
            rate_limit_max_requests: 5,
            rate_limit_window: Duration::minutes(60),
            entitlement_validity: Duration::hours(24),
            history_max_entries: DEFAULT_MAX_HISTORY,
            payment_price: 9.99,
            payment_currency: "USD".to_string(),
            storage_backend: StorageBackend::File(PathBuf::from(".coverletter")),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let rate_limit_max_requests: u32 =
            parse_or("RATE_LIMIT_MAX_REQUESTS", &lookup, defaults.rate_limit_max_requests)?;
        if rate_limit_max_requests == 0 {
            bail!("RATE_LIMIT_MAX_REQUESTS must be at least 1");
        }
        let window_minutes: i64 = parse_or("RATE_LIMIT_WINDOW_MINUTES", &lookup, 60)?;
        if !(1..=MAX_WINDOW_MINUTES).contains(&window_minutes) {
            bail!("RATE_LIMIT_WINDOW_MINUTES must be between 1 and {MAX_WINDOW_MINUTES}");
        }
        let rate_limit_window = Duration::try_minutes(window_minutes)
            .context("RATE_LIMIT_WINDOW_MINUTES is out of range")?;

        let validity_hours: i64 = parse_or("ENTITLEMENT_VALIDITY_HOURS", &lookup, 24)?;
        if !(1..=MAX_VALIDITY_HOURS).contains(&validity_hours) {
            bail!("ENTITLEMENT_VALIDITY_HOURS must be between 1 and {MAX_VALIDITY_HOURS}");
        }
        let entitlement_validity = Duration::try_hours(validity_hours)
            .context("ENTITLEMENT_VALIDITY_HOURS is out of range")?;

        let history_max_entries: usize =
            parse_or("HISTORY_MAX_ENTRIES", &lookup, defaults.history_max_entries)?;
        if !(1..=MAX_HISTORY_ENTRIES).contains(&history_max_entries) {
            bail!("HISTORY_MAX_ENTRIES must be between 1 and {MAX_HISTORY_ENTRIES}");
        }

        let storage_backend = match lookup("REDIS_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => StorageBackend::Redis(url),
            None => match lookup("STORAGE_BACKEND").as_deref() {
                None | Some("file") => StorageBackend::File(
                    lookup("STORAGE_DIR")
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from(".coverletter")),
                ),
                Some("memory") => StorageBackend::Memory,
                Some(other) => bail!("STORAGE_BACKEND must be 'file' or 'memory', got '{other}'"),
            },
        };

        Ok(Config {
            llm: LlmConfig {
                api_url: lookup("LLM_API_URL").unwrap_or(defaults.llm.api_url),
                api_key: lookup("LLM_API_KEY").filter(|k| !k.trim().is_empty()),
                model: lookup("LLM_MODEL").unwrap_or(defaults.llm.model),
                max_tokens: parse_or("LLM_MAX_TOKENS", &lookup, defaults.llm.max_tokens)?,
                temperature: parse_or("LLM_TEMPERATURE", &lookup, defaults.llm.temperature)?,
                timeout_secs: parse_or("LLM_TIMEOUT_SECS", &lookup, defaults.llm.timeout_secs)?,
            },
            rate_limit_max_requests,
            rate_limit_window,
            entitlement_validity,
            history_max_entries,
            payment_price: parse_or("PAYMENT_PRICE", &lookup, defaults.payment_price)?,
            payment_currency: lookup("PAYMENT_CURRENCY").unwrap_or(defaults.payment_currency),
            storage_backend,
            port: parse_or("PORT", &lookup, defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.rate_limit_max_requests, 5);
        assert_eq!(config.rate_limit_window, Duration::minutes(60));
        assert_eq!(config.entitlement_validity, Duration::hours(24));
        assert_eq!(config.history_max_entries, 5);
        assert_eq!(config.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.llm.max_tokens, 1000);
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.storage_backend,
            StorageBackend::File(PathBuf::from(".coverletter"))
        );
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("RATE_LIMIT_MAX_REQUESTS", "10"),
            ("RATE_LIMIT_WINDOW_MINUTES", "30"),
            ("ENTITLEMENT_VALIDITY_HOURS", "48"),
            ("LLM_TEMPERATURE", "0.2"),
            ("LLM_API_KEY", "sk-test"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit_max_requests, 10);
        assert_eq!(config.rate_limit_window, Duration::minutes(30));
        assert_eq!(config.entitlement_validity, Duration::hours(48));
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_blank_api_key_is_treated_as_absent() {
        let config = config_from(&[("LLM_API_KEY", "  ")]).unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_redis_url_selects_redis_backend() {
        let config = config_from(&[
            ("REDIS_URL", "redis://localhost:6379"),
            ("STORAGE_BACKEND", "memory"),
        ])
        .unwrap();
        assert_eq!(
            config.storage_backend,
            StorageBackend::Redis("redis://localhost:6379".to_string())
        );
    }

    #[test]
    fn test_memory_backend() {
        let config = config_from(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(config_from(&[("STORAGE_BACKEND", "s3")]).is_err());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_max_requests_is_rejected() {
        assert!(config_from(&[("RATE_LIMIT_MAX_REQUESTS", "0")]).is_err());
    }

    #[test]
    fn test_non_positive_window_is_rejected() {
        assert!(config_from(&[("RATE_LIMIT_WINDOW_MINUTES", "0")]).is_err());
        assert!(config_from(&[("ENTITLEMENT_VALIDITY_HOURS", "-1")]).is_err());
    }

    #[test]
    fn test_oversized_durations_are_rejected_not_panicking() {
        for value in ["1000000000000", "999999999999999999"] {
            let err = config_from(&[("RATE_LIMIT_WINDOW_MINUTES", value)]).unwrap_err();
            assert!(err.to_string().contains("RATE_LIMIT_WINDOW_MINUTES"));
            let err = config_from(&[("ENTITLEMENT_VALIDITY_HOURS", value)]).unwrap_err();
            assert!(err.to_string().contains("ENTITLEMENT_VALIDITY_HOURS"));
        }
    }

    #[test]
    fn test_duration_upper_bounds_are_accepted() {
        let config = config_from(&[
            ("RATE_LIMIT_WINDOW_MINUTES", "10080"),
            ("ENTITLEMENT_VALIDITY_HOURS", "8760"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit_window, Duration::weeks(1));
        assert_eq!(config.entitlement_validity, Duration::days(365));
    }

    #[test]
    fn test_zero_history_entries_is_rejected() {
        let err = config_from(&[("HISTORY_MAX_ENTRIES", "0")]).unwrap_err();
        assert!(err.to_string().contains("HISTORY_MAX_ENTRIES"));
        assert_eq!(
            config_from(&[("HISTORY_MAX_ENTRIES", "1")])
                .unwrap()
                .history_max_entries,
            1
        );
    }
}
