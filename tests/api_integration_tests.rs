use recipe_gen::api_connection::{
    connection::ApiConnectionError,
    endpoints::{ChatCompletionRequest, ChatMessage, Provider, OPENROUTER_MODELS},
};
use recipe_gen::config::{AppConfig, API_KEY_ENV_VAR};
use recipe_gen::flow::{FlowError, ModelSettings};
use recipe_gen::nutrient_analyzer::{analyze_nutrients, LlmNutrientOracle, DEFAULT_QUANTITY};
use recipe_gen::recipe_generator::{generate_recipe, LlmRecipeOracle};
use recipe_gen::schema::{IngredientQuantity, NutrientAnalysisRequest, RecipeRequest};
use dotenv::dotenv;
use std::env;

fn get_cerebras_test_model() -> String {
    OPENROUTER_MODELS
        .iter()
        .find(|m| m.model_source == "cerebras")
        .map(|m| m.model_name.to_string())
        .expect("No Cerebras model found in OPENROUTER_MODELS for testing")
}

fn setup_test_environment() -> bool {
    dotenv().ok();
    env::var(API_KEY_ENV_VAR).is_ok()
}

fn live_settings() -> ModelSettings {
    ModelSettings {
        model: get_cerebras_test_model(),
        temperature: 0.4,
        max_tokens: 4096,
    }
}

#[tokio::test]
async fn test_missing_api_key_error() {
    dotenv().ok();
    let provider = Provider::openrouter("THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ");
    let request = ChatCompletionRequest {
        model: get_cerebras_test_model(),
        messages: vec![ChatMessage::user("Hello")],
        response_format: None,
        temperature: None,
        max_tokens: None,
    };
    let result = provider.call_chat_completion(request).await;
    assert!(matches!(result, Err(ApiConnectionError::MissingApiKey(_))));
    if let Err(ApiConnectionError::MissingApiKey(key_name)) = result {
        assert_eq!(key_name, "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ");
    }
}

#[tokio::test]
async fn test_missing_api_key_surfaces_as_flow_error() {
    let provider = Provider::from_config(&AppConfig {
        api_key_env_var: "ANOTHER_KEY_THAT_IS_NOT_SET_QWERTY".to_string(),
        ..AppConfig::default()
    });
    let oracle = LlmRecipeOracle::new(provider, live_settings());
    let request = RecipeRequest {
        ingredients: "rice".to_string(),
        allergies: None,
        strict_mode: None,
    };
    let result = generate_recipe(&oracle, &request).await;
    assert!(matches!(
        result,
        Err(FlowError::Api(ApiConnectionError::MissingApiKey(_)))
    ));
}

#[tokio::test]
#[ignore]
async fn test_live_generation_then_analysis() {
    if !setup_test_environment() {
        println!("Skipping test_live_generation_then_analysis: {} not set.", API_KEY_ENV_VAR);
        return;
    }
    let provider = Provider::openrouter(API_KEY_ENV_VAR);

    let recipe_oracle = LlmRecipeOracle::new(provider.clone(), live_settings());
    let request = RecipeRequest {
        ingredients: "chicken, broccoli, rice".to_string(),
        allergies: Some(String::new()),
        strict_mode: Some(false),
    };
    let recipe = generate_recipe(&recipe_oracle, &request)
        .await
        .expect("recipe generation failed");
    assert!(!recipe.ingredients.is_empty());
    assert!(!recipe.instructions.is_empty());

    let nutrient_oracle = LlmNutrientOracle::new(provider, live_settings());
    let analysis_request = NutrientAnalysisRequest {
        recipe_name: recipe.recipe_name.clone(),
        ingredients: recipe
            .ingredients
            .iter()
            .map(|name| IngredientQuantity {
                name: name.clone(),
                quantity: DEFAULT_QUANTITY.to_string(),
            })
            .collect(),
    };
    let analysis = analyze_nutrients(&nutrient_oracle, &analysis_request)
        .await
        .expect("nutrient analysis failed");
    assert!(analysis.recipe_analysis.total_calories > 0.0);
}

#[tokio::test]
#[ignore]
async fn test_api_error_with_invalid_key() {
    dotenv().ok();

    const INVALID_KEY_ENV_NAME_FOR_THIS_TEST: &str = "ENV_VAR_WITH_BAD_KEY_VALUE";

    unsafe {
        std::env::set_var(
            INVALID_KEY_ENV_NAME_FOR_THIS_TEST,
            "this_is_a_deliberately_bad_api_key_string_for_testing",
        );
    }

    let provider = Provider::openrouter(INVALID_KEY_ENV_NAME_FOR_THIS_TEST);
    let request = ChatCompletionRequest {
        model: get_cerebras_test_model(),
        messages: vec![ChatMessage::user("This call should fail due to invalid key.")],
        response_format: None,
        temperature: None,
        max_tokens: None,
    };

    let result = provider.call_chat_completion(request).await;
    assert!(
        matches!(result, Err(ApiConnectionError::ApiError { .. })),
        "Expected ApiError, got {:?}",
        result
    );
    if let Err(ApiConnectionError::ApiError { status, .. }) = result {
        assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
    }

    unsafe {
        std::env::remove_var(INVALID_KEY_ENV_NAME_FOR_THIS_TEST);
    }
}
