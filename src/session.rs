//! The single form / recipe / analysis state triple and its two actions.

use colored::Colorize;
use tracing::{error, info, warn};

use crate::form::{FormError, IngredientForm, QuantitySheet};
use crate::nutrient_analyzer::{analyze_nutrients, NutrientOracle};
use crate::recipe_generator::{generate_recipe, RecipeOracle};
use crate::schema::{NutrientAnalysisResult, Recipe};
use crate::timer::StepProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Toast-style user notifications.
pub trait Notifier {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Prints notices to stderr and mirrors them into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Info => {
                info!("{}", message);
                eprintln!("{} {}", "ℹ".blue(), message);
            }
            NoticeKind::Success => {
                info!("{}", message);
                eprintln!("{} {}", "✔".green(), message);
            }
            NoticeKind::Error => {
                warn!("{}", message);
                eprintln!("{} {}", "✘".red().bold(), message.red());
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    pub form: IngredientForm,
    recipe: Option<Recipe>,
    analysis: Option<NutrientAnalysisResult>,
    steps: Vec<StepProgress>,
    quantities: QuantitySheet,
}

impl Session {
    pub fn new(form: IngredientForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn analysis(&self) -> Option<&NutrientAnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn steps(&self) -> &[StepProgress] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut [StepProgress] {
        &mut self.steps
    }

    pub fn quantities(&self) -> &QuantitySheet {
        &self.quantities
    }

    /// Sets the quantity of the generated recipe's ingredient at `index`.
    pub fn set_quantity(&mut self, index: usize, quantity: &str) -> Result<(), FormError> {
        self.quantities.set_quantity(index, quantity)
    }

    /// Installs a recipe (generated or loaded from disk) and resets everything
    /// derived from the previous one.
    pub fn load_recipe(&mut self, recipe: Recipe) {
        self.steps = StepProgress::for_recipe(&recipe);
        self.quantities = QuantitySheet::new(&recipe, &self.form);
        self.analysis = None;
        self.recipe = Some(recipe);
    }

    /// Generates a recipe from the form. On any failure the previous recipe,
    /// analysis and steps are left exactly as they were.
    pub async fn generate(&mut self, oracle: &dyn RecipeOracle, notifier: &dyn Notifier) -> bool {
        let request = match self.form.to_recipe_request() {
            Ok(request) => request,
            Err(e) => {
                notifier.notify(NoticeKind::Error, &e.to_string());
                return false;
            }
        };

        match generate_recipe(oracle, &request).await {
            Ok(recipe) => {
                let name = recipe.recipe_name.clone();
                self.load_recipe(recipe);
                notifier.notify(NoticeKind::Success, &format!("Recipe ready: {}", name));
                true
            }
            Err(e) if e.is_input_error() => {
                notifier.notify(NoticeKind::Error, &e.to_string());
                false
            }
            Err(e) => {
                error!(error = %e, "recipe generation failed");
                notifier.notify(NoticeKind::Error, &format!("Failed to generate recipe: {}", e));
                false
            }
        }
    }

    /// Analyses the current recipe with the quantities on the sheet.
    pub async fn analyze(&mut self, oracle: &dyn NutrientOracle, notifier: &dyn Notifier) -> bool {
        let Some(recipe) = self.recipe.as_ref() else {
            notifier.notify(NoticeKind::Error, "Generate a recipe before analyzing nutrients.");
            return false;
        };
        let request = self.quantities.to_request(&recipe.recipe_name);

        match analyze_nutrients(oracle, &request).await {
            Ok(analysis) => {
                let calories = analysis.recipe_analysis.total_calories;
                self.analysis = Some(analysis);
                notifier.notify(
                    NoticeKind::Success,
                    &format!("Nutrient analysis complete: {:.0} kcal", calories),
                );
                true
            }
            Err(e) if e.is_input_error() => {
                notifier.notify(NoticeKind::Error, &e.to_string());
                false
            }
            Err(e) => {
                error!(error = %e, "nutrient analysis failed");
                notifier.notify(NoticeKind::Error, &format!("Failed to analyze nutrients: {}", e));
                false
            }
        }
    }
}
