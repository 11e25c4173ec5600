use std::env;
use std::time::Duration;

use dotenv::dotenv;
use tracing::warn;

use crate::api_connection::endpoints::{DEFAULT_GEMINI_MODEL, GEMINI_API_URL};
use crate::error::AdvisorError;
use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_ENV_VAR: &str = "GEMINI_MODEL";
pub const API_URL_ENV_VAR: &str = "GEMINI_API_URL";
pub const LANGUAGE_ENV_VAR: &str = "ADVISOR_RESPONSE_LANGUAGE";
pub const MAX_ATTEMPTS_ENV_VAR: &str = "ADVISOR_MAX_ATTEMPTS";
pub const RETRY_DELAY_ENV_VAR: &str = "ADVISOR_RETRY_DELAY_MS";
pub const TEMPERATURE_ENV_VAR: &str = "ADVISOR_TEMPERATURE";
pub const MAX_OUTPUT_TOKENS_ENV_VAR: &str = "ADVISOR_MAX_OUTPUT_TOKENS";

pub const DEFAULT_RESPONSE_LANGUAGE: &str = "Korean";

/// Values shipped in `.env` templates that are not real keys.
pub const PLACEHOLDER_KEYS: &[&str] = &["your_gemini_api_key_here", "PLACEHOLDER_API_KEY"];
const SUSPICIOUSLY_SHORT_KEY: usize = 20;

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub response_language: String,
    /// Sampling temperature sent with every request; the service default when unset.
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub retry: RetryPolicy,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_url: GEMINI_API_URL.to_string(),
            response_language: DEFAULT_RESPONSE_LANGUAGE.to_string(),
            temperature: None,
            max_output_tokens: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl AdvisorConfig {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let max_attempts = non_blank(MAX_ATTEMPTS_ENV_VAR)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let base_delay = non_blank(RETRY_DELAY_ENV_VAR)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BASE_DELAY);
        let temperature = non_blank(TEMPERATURE_ENV_VAR)
            .and_then(|v| v.trim().parse::<f32>().ok())
            .filter(|t| t.is_finite() && *t >= 0.0);
        let max_output_tokens = non_blank(MAX_OUTPUT_TOKENS_ENV_VAR)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|n| *n > 0);

        Self {
            api_key: non_blank(API_KEY_ENV_VAR).map(|v| v.trim().to_string()),
            model: non_blank(MODEL_ENV_VAR).unwrap_or(defaults.model),
            api_url: non_blank(API_URL_ENV_VAR).unwrap_or(defaults.api_url),
            response_language: non_blank(LANGUAGE_ENV_VAR).unwrap_or(defaults.response_language),
            temperature,
            max_output_tokens,
            retry: RetryPolicy {
                max_attempts,
                base_delay,
            },
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The credential, or the configuration error that keeps us from using it.
    pub fn credential(&self) -> Result<&str, AdvisorError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AdvisorError::MissingCredential(API_KEY_ENV_VAR.to_string()))?;
        if PLACEHOLDER_KEYS.contains(&key) {
            return Err(AdvisorError::PlaceholderCredential(API_KEY_ENV_VAR.to_string()));
        }
        if key.len() < SUSPICIOUSLY_SHORT_KEY {
            warn!("{} looks too short, check that it is a real key", API_KEY_ENV_VAR);
        }
        Ok(key)
    }
}
