use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const BASE_URL_VAR: &str = "OPENROUTER_BASE_URL";
pub const MODEL_VAR: &str = "OPENROUTER_MODEL";
pub const MAX_TOKENS_VAR: &str = "OPENROUTER_MAX_TOKENS";
pub const TIMEOUT_VAR: &str = "OPENROUTER_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "minimax/minimax-m2.5";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Re-read from this environment variable on every request.
    Env(String),
    Static(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env(var) => f.debug_tuple("Env").field(var).finish(),
            Self::Static(_) => f.debug_tuple("Static").field(&"<redacted>").finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub credential: Credential,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            credential: Credential::Env(API_KEY_VAR.to_string()),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base_url) = non_empty(lookup(BASE_URL_VAR)) {
            config.base_url = base_url;
        }
        if let Some(model) = non_empty(lookup(MODEL_VAR)) {
            config.model = model;
        }
        if let Some(max_tokens) = non_empty(lookup(MAX_TOKENS_VAR)) {
            config.max_tokens = parse_positive(MAX_TOKENS_VAR, &max_tokens)?;
        }
        if let Some(timeout) = non_empty(lookup(TIMEOUT_VAR)) {
            let secs: u64 = parse_positive(TIMEOUT_VAR, &timeout)?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Zero is rejected along with unparseable values.
fn parse_positive<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match value.parse::<T>() {
        Ok(parsed) if parsed != T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}
