use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, Provider, ResponseFormat};
use crate::flow::{FlowError, ModelSettings};
use crate::form::ingredient_words;
use crate::schema::{recipe_json_schema, Recipe, RecipeRequest};

/// Anything that can turn an ingredient request into a recipe.
#[async_trait]
pub trait RecipeOracle: Send + Sync {
    async fn generate(&self, request: &RecipeRequest) -> Result<Recipe, FlowError>;
}

const SYSTEM_PROMPT: &str = "/no_thinking
You are a world-class chef. You answer with a single JSON object and nothing else: \
no explanatory text and no markdown formatting before or after it.";

pub fn render_recipe_prompt(request: &RecipeRequest) -> String {
    let allergies = request
        .allergies
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("none");
    let strict_clause = if request.is_strict() {
        "Strict mode is ON: use ONLY the ingredients listed above and add nothing else, not even pantry staples."
    } else {
        "Strict mode is OFF: you may add common pantry items (oil, salt, spices) if the dish needs them."
    };

    format!(
        "Generate a recipe based on the ingredients provided, taking into account any specified allergies.

Ingredients: {ingredients}
Allergies (if any): {allergies}

{strict_clause}
If an ingredient conflicts with an allergy, leave it out or substitute it. If the allergen cannot be avoided, explain it in \"allergyWarning\"; otherwise omit \"allergyWarning\".

Instructions should be provided step by step. Only steps that involve waiting (baking, simmering, resting, marinating) get a \"timer\", formatted as HH:MM:SS. Leave \"timer\" out for every other step.

Also provide a list of exactly 3 alternative recipes that can be made with the given ingredients.

Respond with a JSON object of this shape:
{{
  \"recipeName\": \"string\",
  \"ingredients\": [\"ingredient name\", ...],
  \"instructions\": [
    {{ \"step\": \"Preheat oven to 375 degrees F (190 degrees C).\" }},
    {{ \"step\": \"Bake until edges are nicely browned.\", \"timer\": \"00:10:00\" }}
  ],
  \"alternateRecipes\": [
    {{ \"name\": \"string\", \"description\": \"One sentence.\" }}
  ],
  \"allergyWarning\": \"string, only when needed\"
}}",
        ingredients = request.ingredients.trim(),
    )
}

/// Recipe oracle backed by a chat-completion model.
pub struct LlmRecipeOracle {
    provider: Provider,
    settings: ModelSettings,
}

impl LlmRecipeOracle {
    pub fn new(provider: Provider, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }

    pub fn build_request(&self, request: &RecipeRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(render_recipe_prompt(request)),
            ],
            response_format: Some(ResponseFormat::json_schema("generated_recipe", recipe_json_schema())),
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
        }
    }
}

#[async_trait]
impl RecipeOracle for LlmRecipeOracle {
    async fn generate(&self, request: &RecipeRequest) -> Result<Recipe, FlowError> {
        let chat_request = self.build_request(request);
        Ok(self.provider.complete_structured::<Recipe>(chat_request).await?)
    }
}

/// Runs the generation flow once: validate input, ask the oracle, validate output.
pub async fn generate_recipe(
    oracle: &dyn RecipeOracle,
    request: &RecipeRequest,
) -> Result<Recipe, FlowError> {
    if request.ingredient_names().is_empty() {
        return Err(FlowError::EmptyIngredients);
    }
    info!(ingredients = %request.ingredients, strict = request.is_strict(), "generating recipe");

    let recipe = oracle.generate(request).await?;
    validate_recipe(&recipe)?;

    if request.is_strict() {
        let extras = strict_mode_violations(request, &recipe);
        if !extras.is_empty() {
            warn!(?extras, "strict mode recipe uses ingredients that were not supplied");
        }
    }
    info!(recipe = %recipe.recipe_name, steps = recipe.instructions.len(), "recipe generated");
    Ok(recipe)
}

pub fn validate_recipe(recipe: &Recipe) -> Result<(), FlowError> {
    if recipe.recipe_name.trim().is_empty() {
        return Err(FlowError::InvalidOutput("recipe has no name".to_string()));
    }
    if recipe.ingredients.iter().all(|i| i.trim().is_empty()) {
        return Err(FlowError::InvalidOutput("recipe has no ingredients".to_string()));
    }
    if recipe.instructions.iter().all(|s| s.step.trim().is_empty()) {
        return Err(FlowError::InvalidOutput("recipe has no instructions".to_string()));
    }
    Ok(())
}

/// Recipe ingredients that share no significant word with any supplied ingredient.
pub fn strict_mode_violations(request: &RecipeRequest, recipe: &Recipe) -> Vec<String> {
    let supplied: HashSet<String> = request
        .ingredient_names()
        .into_iter()
        .flat_map(ingredient_words)
        .collect();
    recipe
        .ingredients
        .iter()
        .filter(|ingredient| {
            let words = ingredient_words(ingredient);
            !words.is_empty() && words.is_disjoint(&supplied)
        })
        .cloned()
        .collect()
}
