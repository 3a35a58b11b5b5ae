use dotenv::dotenv;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::env;
use thiserror::Error;
use tracing::{debug, warn};

use super::content::clean_json_payload;
use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, OpenRouterAvailableModel, Provider,
    OPENROUTER_MODELS,
};
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("No response choices received from API")]
    NoChoices,
    #[error("API returned no JSON object in its content: {0:?}")]
    EmptyContent(String),
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        Self::from_config(&AppConfig {
            api_key_env_var: api_key_env_var_name.to_string(),
            ..AppConfig::default()
        })
    }

    pub fn from_config(config: &AppConfig) -> Self {
        dotenv().ok();
        Self::OpenRouter {
            api_key: config.api_key_env_var.clone(),
            base_url: config.base_url.clone(),
            provider_only: config.provider_only.clone(),
            site_url: config.site_url.clone(),
            app_name: config.app_name.clone(),
            timeout: config.timeout,
            client: Client::new(),
            available_models: OPENROUTER_MODELS.to_vec(),
        }
    }

    pub fn get_available_models(&self) -> Vec<OpenRouterAvailableModel> {
        match self {
            Provider::OpenRouter {
                available_models, ..
            } => available_models.clone(),
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                base_url,
                provider_only,
                site_url,
                app_name,
                timeout,
                client,
                ..
            } => {
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let url = format!("{}/chat/completions", base_url);

                let mut request_payload = serde_json::to_value(&request)?;
                if let (Some(only), Some(obj)) = (provider_only, request_payload.as_object_mut()) {
                    obj.insert("provider".to_string(), json!({ "only": [only] }));
                }

                debug!(model = %request.model, %url, "sending chat completion");

                let response = client
                    .post(&url)
                    .bearer_auth(actual_api_key)
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .timeout(*timeout)
                    .json(&request_payload)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }

    /// Sends `request` and decodes the first choice's content as `T`.
    pub async fn complete_structured<T: DeserializeOwned>(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<T, ApiConnectionError> {
        let response = self.call_chat_completion(request).await?;
        decode_first_choice(&response)
    }
}

/// Pulls the JSON payload out of the first choice and deserializes it.
pub fn decode_first_choice<T: DeserializeOwned>(
    response: &ChatCompletionResponse,
) -> Result<T, ApiConnectionError> {
    let choice = response.choices.first().ok_or(ApiConnectionError::NoChoices)?;
    let raw = choice.message.content.as_deref().unwrap_or_default();
    debug!("raw model content:\n{}", raw);

    let payload = clean_json_payload(raw)
        .ok_or_else(|| ApiConnectionError::EmptyContent(raw.chars().take(200).collect()))?;

    serde_json::from_str(payload).map_err(|e| {
        warn!(error = %e, "model output does not match the expected shape");
        ApiConnectionError::SerializationError(e)
    })
}
