use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::api_connection::endpoints::{DEFAULT_MODEL, OPENROUTER_BASE_URL};

// Environment variable names
pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
const API_KEY_VAR_NAME_ENV: &str = "RECIPE_GEN_API_KEY_VAR";
const BASE_URL_ENV: &str = "RECIPE_GEN_BASE_URL";
const MODEL_ENV: &str = "RECIPE_GEN_MODEL";
const TEMPERATURE_ENV: &str = "RECIPE_GEN_TEMPERATURE";
const MAX_TOKENS_ENV: &str = "RECIPE_GEN_MAX_TOKENS";
const TIMEOUT_ENV: &str = "RECIPE_GEN_TIMEOUT_SECS";
const PROVIDER_ONLY_ENV: &str = "RECIPE_GEN_PROVIDER_ONLY";
const SITE_URL_ENV: &str = "SITE_URL";
const APP_NAME_ENV: &str = "APP_NAME";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for talking to the model backend.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Name of the env var that holds the API key (not the key itself).
    pub api_key_env_var: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub provider_only: Option<String>,
    pub site_url: String,
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout: Duration::from_secs(120),
            provider_only: None,
            site_url: "http://localhost:3000".to_string(),
            app_name: "RecipeGen".to_string(),
        }
    }
}

impl AppConfig {
    /// Builds the config from the process environment (call `dotenv` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] but reads through `lookup`, so tests
    /// never touch the real environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let temperature = match get(TEMPERATURE_ENV) {
            Some(raw) => parse_number::<f32>(TEMPERATURE_ENV, &raw)?,
            None => defaults.temperature,
        };
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: TEMPERATURE_ENV,
                value: temperature.to_string(),
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }
        let max_tokens = match get(MAX_TOKENS_ENV) {
            Some(raw) => parse_number::<u32>(MAX_TOKENS_ENV, &raw)?,
            None => defaults.max_tokens,
        };
        let timeout = match get(TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(parse_number::<u64>(TIMEOUT_ENV, &raw)?),
            None => defaults.timeout,
        };

        Ok(Self {
            api_key_env_var: get(API_KEY_VAR_NAME_ENV).unwrap_or(defaults.api_key_env_var),
            base_url: get(BASE_URL_ENV)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: get(MODEL_ENV).unwrap_or(defaults.model),
            temperature,
            max_tokens,
            timeout,
            provider_only: get(PROVIDER_ONLY_ENV),
            site_url: get(SITE_URL_ENV).unwrap_or(defaults.site_url),
            app_name: get(APP_NAME_ENV).unwrap_or(defaults.app_name),
        })
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
