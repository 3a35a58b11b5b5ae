//! Wire contract shared by the two model-backed flows.
//!
//! Field names are camelCase on the wire so the JSON the model produces for
//! the schemas below maps directly onto these structs.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::api_connection::endpoints::JsonSchema;
use crate::nutrition::parse_amount;
use crate::timer::parse_timer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    /// Comma-separated ingredients, optionally with quantity and unit.
    pub ingredients: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,
}

impl RecipeRequest {
    pub fn is_strict(&self) -> bool {
        self.strict_mode.unwrap_or(false)
    }

    /// Ingredient entries as the user typed them, blanks dropped.
    pub fn ingredient_names(&self) -> Vec<&str> {
        self.ingredients
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<String>,
}

impl RecipeStep {
    /// Canonical duration of the step's timer, `None` when absent or unparsable.
    pub fn timer_duration(&self) -> Option<Duration> {
        self.timer.as_deref().and_then(parse_timer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternateRecipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<RecipeStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_recipes: Option<Vec<AlternateRecipe>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergy_warning: Option<String>,
}

impl Recipe {
    /// The allergy warning, treating a blank string as no warning.
    pub fn allergy_warning(&self) -> Option<&str> {
        self.allergy_warning
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty() && !w.eq_ignore_ascii_case("none"))
    }

    pub fn alternates(&self) -> &[AlternateRecipe] {
        self.alternate_recipes.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientQuantity {
    pub name: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientAnalysisRequest {
    pub recipe_name: String,
    pub ingredients: Vec<IngredientQuantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientInfo {
    pub name: String,
    /// Free-form amount, e.g. `"12"`, `"12g"`, `"12.5 mg"`. Never trust it as a number.
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

impl NutrientInfo {
    pub fn value(&self) -> f64 {
        parse_amount(&self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientNutrientAnalysis {
    pub name: String,
    #[serde(default)]
    pub macronutrients: Vec<NutrientInfo>,
    #[serde(default)]
    pub micronutrients: Vec<NutrientInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeNutrientAnalysis {
    pub recipe_name: String,
    #[serde(deserialize_with = "lenient_number")]
    pub total_calories: f64,
    #[serde(default)]
    pub macronutrients: Vec<NutrientInfo>,
    #[serde(default)]
    pub micronutrients: Vec<NutrientInfo>,
    #[serde(default)]
    pub healthiness_assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientAnalysisResult {
    #[serde(default)]
    pub ingredient_analyses: Vec<IngredientNutrientAnalysis>,
    pub recipe_analysis: RecipeNutrientAnalysis,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(text) => text,
        StringOrNumber::Number(number) => number.to_string(),
    })
}

// Calorie totals sometimes come back as "450 kcal"; those degrade through parse_amount.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(text) => parse_amount(&text),
        StringOrNumber::Number(number) => number.as_f64().filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0),
    })
}

fn nutrient_info_schema() -> JsonSchema {
    JsonSchema::object(
        vec![
            ("name", JsonSchema::string("The name of the nutrient.")),
            ("amount", JsonSchema::string("The amount of the nutrient (e.g., 10g, 5mg).")),
            ("unit", JsonSchema::string("The unit of measurement for the nutrient (e.g., g, mg, mcg).")),
        ],
        &["name", "amount", "unit"],
    )
}

pub fn recipe_json_schema() -> JsonSchema {
    let step = JsonSchema::object(
        vec![
            ("step", JsonSchema::string("A single step in the recipe instructions.")),
            (
                "timer",
                JsonSchema::string("Time required for this step in HH:MM:SS, only for steps that involve waiting."),
            ),
        ],
        &["step"],
    );
    let alternate = JsonSchema::object(
        vec![
            ("name", JsonSchema::string("The name of the alternate recipe.")),
            ("description", JsonSchema::string("A short description of the alternate recipe.")),
        ],
        &["name", "description"],
    );

    JsonSchema::object(
        vec![
            ("recipeName", JsonSchema::string("The name of the generated recipe.")),
            (
                "ingredients",
                JsonSchema::array(JsonSchema::string("An ingredient name."), "The ingredients required for the recipe."),
            ),
            ("instructions", JsonSchema::array(step, "The cooking instructions, step by step.")),
            (
                "alternateRecipes",
                JsonSchema::array(alternate, "Alternative recipes that can be made with the given ingredients."),
            ),
            ("allergyWarning", JsonSchema::string("A warning if the recipe may contain allergens.")),
        ],
        &["recipeName", "ingredients", "instructions"],
    )
}

pub fn nutrient_analysis_json_schema() -> JsonSchema {
    let nutrients = |description: &str| JsonSchema::array(nutrient_info_schema(), description);
    let ingredient = JsonSchema::object(
        vec![
            ("name", JsonSchema::string("The name of the ingredient.")),
            ("macronutrients", nutrients("The macronutrient content of the ingredient.")),
            ("micronutrients", nutrients("The micronutrient content of the ingredient.")),
        ],
        &["name", "macronutrients", "micronutrients"],
    );
    let recipe = JsonSchema::object(
        vec![
            ("recipeName", JsonSchema::string("The name of the recipe.")),
            ("totalCalories", JsonSchema::number("The total number of calories in the recipe.")),
            ("macronutrients", nutrients("The total macronutrient content of the recipe.")),
            ("micronutrients", nutrients("The total micronutrient content of the recipe.")),
            (
                "healthinessAssessment",
                JsonSchema::string("An assessment of the recipe's healthiness, including any potential concerns."),
            ),
        ],
        &["recipeName", "totalCalories", "macronutrients", "micronutrients", "healthinessAssessment"],
    )
    .with_description("The nutrient analysis for the entire recipe.");

    JsonSchema::object(
        vec![
            (
                "ingredientAnalyses",
                JsonSchema::array(ingredient, "A list of nutrient analyses for each ingredient."),
            ),
            ("recipeAnalysis", recipe),
        ],
        &["ingredientAnalyses", "recipeAnalysis"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recipe_decodes_with_null_timer_and_missing_optionals() {
        let recipe: Recipe = serde_json::from_value(json!({
            "recipeName": "Chicken Stir Fry",
            "ingredients": ["chicken", "broccoli"],
            "instructions": [
                { "step": "Chop everything.", "timer": null },
                { "step": "Simmer.", "timer": "00:10:00" }
            ]
        }))
        .unwrap();

        assert_eq!(recipe.instructions[0].timer, None);
        assert_eq!(recipe.instructions[1].timer_duration(), Some(Duration::from_secs(600)));
        assert!(recipe.alternates().is_empty());
        assert_eq!(recipe.allergy_warning(), None);
    }

    #[test]
    fn blank_allergy_warning_counts_as_absent() {
        let mut recipe: Recipe = serde_json::from_value(json!({
            "recipeName": "Salad",
            "ingredients": ["lettuce"],
            "instructions": [{ "step": "Toss." }],
            "allergyWarning": "  "
        }))
        .unwrap();
        assert_eq!(recipe.allergy_warning(), None);

        recipe.allergy_warning = Some("Contains peanuts.".to_string());
        assert_eq!(recipe.allergy_warning(), Some("Contains peanuts."));
    }

    #[test]
    fn request_serializes_camel_case_and_skips_absent_fields() {
        let request = RecipeRequest {
            ingredients: "rice".to_string(),
            allergies: None,
            strict_mode: Some(true),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "ingredients": "rice", "strictMode": true }));
    }

    #[test]
    fn ingredient_names_split_on_commas() {
        let request = RecipeRequest {
            ingredients: "chicken, broccoli,, rice ".to_string(),
            allergies: None,
            strict_mode: None,
        };
        assert_eq!(request.ingredient_names(), vec!["chicken", "broccoli", "rice"]);
    }

    #[test]
    fn nutrient_amounts_accept_numbers_and_strings() {
        let analysis: RecipeNutrientAnalysis = serde_json::from_value(json!({
            "recipeName": "Bowl",
            "totalCalories": "520 kcal",
            "macronutrients": [
                { "name": "Protein", "amount": 32.5, "unit": "g" },
                { "name": "Fat", "amount": "12g", "unit": "g" }
            ],
            "micronutrients": [{ "name": "Iron", "amount": "2.1 mg" }],
            "healthinessAssessment": "Balanced."
        }))
        .unwrap();

        assert_eq!(analysis.total_calories, 520.0);
        assert_eq!(analysis.macronutrients[0].amount, "32.5");
        assert_eq!(analysis.macronutrients[1].value(), 12.0);
        assert_eq!(analysis.micronutrients[0].unit, "");
    }

    #[test]
    fn schemas_require_the_contract_fields() {
        let recipe = serde_json::to_value(recipe_json_schema()).unwrap();
        assert_eq!(recipe["required"], json!(["recipeName", "ingredients", "instructions"]));
        assert_eq!(recipe["properties"]["instructions"]["items"]["properties"]["timer"]["type"], "string");

        let analysis = serde_json::to_value(nutrient_analysis_json_schema()).unwrap();
        assert_eq!(
            analysis["properties"]["recipeAnalysis"]["properties"]["totalCalories"]["type"],
            "number"
        );
    }
}
