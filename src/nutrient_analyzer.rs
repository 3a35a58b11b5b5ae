use async_trait::async_trait;
use std::fmt::Write as _;
use tracing::info;

use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, Provider, ResponseFormat};
use crate::flow::{FlowError, ModelSettings};
use crate::schema::{nutrient_analysis_json_schema, NutrientAnalysisRequest, NutrientAnalysisResult};

/// Quantity sent for an ingredient the user gave no amount for.
pub const DEFAULT_QUANTITY: &str = "1 serving";

#[async_trait]
pub trait NutrientOracle: Send + Sync {
    async fn analyze(&self, request: &NutrientAnalysisRequest) -> Result<NutrientAnalysisResult, FlowError>;
}

const SYSTEM_PROMPT: &str = "/no_thinking
You are a registered dietitian and nutrition analyst. You answer with a single JSON object \
and nothing else: no explanatory text and no markdown formatting before or after it.";

pub fn render_analysis_prompt(request: &NutrientAnalysisRequest) -> String {
    let mut ingredients = String::new();
    for ingredient in &request.ingredients {
        let _ = writeln!(ingredients, "- Name: {}, Quantity: {}", ingredient.name, ingredient.quantity);
    }

    format!(
        "Analyze the nutrient content of the following recipe:

Recipe Name: {recipe_name}

Ingredients:
{ingredients}
Analyze the macronutrient and micronutrient content of each ingredient, as well as the final recipe.
Macronutrients should include at least Protein, Carbohydrates, Fat and Fiber; micronutrients should cover the notable vitamins and minerals (e.g. Sodium, Iron, Calcium, Vitamin C).

Also, provide an assessment of the recipe's healthiness, including the total calorie count and any potential concerns.

Respond with a JSON object of this shape:
{{
  \"ingredientAnalyses\": [
    {{
      \"name\": \"ingredient name\",
      \"macronutrients\": [{{ \"name\": \"Protein\", \"amount\": \"12\", \"unit\": \"g\" }}],
      \"micronutrients\": [{{ \"name\": \"Iron\", \"amount\": \"1.2\", \"unit\": \"mg\" }}]
    }}
  ],
  \"recipeAnalysis\": {{
    \"recipeName\": \"{recipe_name}\",
    \"totalCalories\": 0,
    \"macronutrients\": [],
    \"micronutrients\": [],
    \"healthinessAssessment\": \"string\"
  }}
}}",
        recipe_name = request.recipe_name.trim(),
    )
}

/// Nutrient oracle backed by a chat-completion model.
pub struct LlmNutrientOracle {
    provider: Provider,
    settings: ModelSettings,
}

impl LlmNutrientOracle {
    pub fn new(provider: Provider, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }

    pub fn build_request(&self, request: &NutrientAnalysisRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(render_analysis_prompt(request)),
            ],
            response_format: Some(ResponseFormat::json_schema(
                "nutrient_analysis",
                nutrient_analysis_json_schema(),
            )),
            // Estimates should not wander between runs.
            temperature: Some(self.settings.temperature.min(0.3)),
            max_tokens: Some(self.settings.max_tokens),
        }
    }
}

#[async_trait]
impl NutrientOracle for LlmNutrientOracle {
    async fn analyze(&self, request: &NutrientAnalysisRequest) -> Result<NutrientAnalysisResult, FlowError> {
        let chat_request = self.build_request(request);
        Ok(self
            .provider
            .complete_structured::<NutrientAnalysisResult>(chat_request)
            .await?)
    }
}

/// Runs the analysis flow once: validate input, ask the oracle.
pub async fn analyze_nutrients(
    oracle: &dyn NutrientOracle,
    request: &NutrientAnalysisRequest,
) -> Result<NutrientAnalysisResult, FlowError> {
    if request.recipe_name.trim().is_empty() {
        return Err(FlowError::MissingRecipeName);
    }
    if request.ingredients.iter().all(|i| i.name.trim().is_empty()) {
        return Err(FlowError::EmptyIngredients);
    }
    info!(recipe = %request.recipe_name, ingredients = request.ingredients.len(), "analyzing nutrients");

    let mut result = oracle.analyze(request).await?;
    if result.recipe_analysis.recipe_name.trim().is_empty() {
        result.recipe_analysis.recipe_name = request.recipe_name.clone();
    }
    info!(calories = result.recipe_analysis.total_calories, "nutrient analysis complete");
    Ok(result)
}
