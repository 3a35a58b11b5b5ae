use thiserror::Error;

use crate::api_connection::connection::ApiConnectionError;
use crate::config::AppConfig;

/// Failure of one model-backed flow call. Nothing here is fatal; callers
/// surface it to the user and keep their previous state.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("please enter at least one ingredient")]
    EmptyIngredients,
    #[error("a recipe name is required for nutrient analysis")]
    MissingRecipeName,
    #[error("model call failed: {0}")]
    Api(#[from] ApiConnectionError),
    #[error("model output failed validation: {0}")]
    InvalidOutput(String),
}

impl FlowError {
    /// True for errors raised before any network call was made.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyIngredients | Self::MissingRecipeName)
    }
}

/// Model parameters shared by both LLM-backed oracles.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&AppConfig> for ModelSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}
