//! Editable ingredient rows and the translation between them and the flows.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::nutrient_analyzer::DEFAULT_QUANTITY;
use crate::schema::{IngredientQuantity, NutrientAnalysisRequest, Recipe, RecipeRequest};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("add at least one ingredient before generating a recipe")]
    NoIngredients,
    #[error("no ingredient row at position {index} (there are {len})")]
    RowOutOfRange { index: usize, len: usize },
    #[error("slider value {0} is outside 0-100")]
    SliderOutOfRange(u8),
}

/// Identity of a row, fixed at creation and unaffected by edits or removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Protein,
    Carbs,
    Fat,
}

impl Preference {
    /// `"protein"`, `"carbs"` (or `"carbohydrates"`), `"fat"`; case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "protein" => Some(Self::Protein),
            "carb" | "carbs" | "carbohydrates" => Some(Self::Carbs),
            "fat" => Some(Self::Fat),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Protein => "protein",
            Self::Carbs => "carbs",
            Self::Fat => "fat",
        }
    }
}

/// Optional per-ingredient sliders (0-100) nudging the recipe's macro focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NutrientPreferences {
    pub protein: Option<u8>,
    pub carbs: Option<u8>,
    pub fat: Option<u8>,
}

impl NutrientPreferences {
    pub fn get(&self, preference: Preference) -> Option<u8> {
        match preference {
            Preference::Protein => self.protein,
            Preference::Carbs => self.carbs,
            Preference::Fat => self.fat,
        }
    }

    fn slot(&mut self, preference: Preference) -> &mut Option<u8> {
        match preference {
            Preference::Protein => &mut self.protein,
            Preference::Carbs => &mut self.carbs,
            Preference::Fat => &mut self.fat,
        }
    }

    fn hint(&self) -> Option<String> {
        let parts: Vec<String> = [Preference::Protein, Preference::Carbs, Preference::Fat]
            .into_iter()
            .filter_map(|p| self.get(p).map(|v| format!("{} {}", p.label(), v)))
            .collect();
        (!parts.is_empty()).then(|| format!("[{}]", parts.join(", ")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRow {
    pub id: RowId,
    pub name: String,
    pub quantity: String,
    pub unit: Option<String>,
    pub preferences: NutrientPreferences,
}

impl IngredientRow {
    pub fn blank() -> Self {
        Self {
            id: RowId::new(),
            name: String::new(),
            quantity: String::new(),
            unit: None,
            preferences: NutrientPreferences::default(),
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            ..Self::blank()
        }
    }

    pub fn with_quantity(mut self, quantity: &str, unit: Option<&str>) -> Self {
        self.quantity = quantity.trim().to_string();
        self.unit = unit.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string);
        self
    }

    /// Sets one slider; values above 100 are rejected.
    pub fn with_preference(mut self, preference: Preference, value: Option<u8>) -> Result<Self, FormError> {
        if let Some(v) = value.filter(|v| *v > 100) {
            return Err(FormError::SliderOutOfRange(v));
        }
        *self.preferences.slot(preference) = value;
        Ok(self)
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// `"200 gram"`, `"2"`, or `None` when no quantity was entered.
    pub fn quantity_text(&self) -> Option<String> {
        let quantity = self.quantity.trim();
        if quantity.is_empty() {
            return None;
        }
        Some(match self.unit.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(unit) => format!("{} {}", quantity, unit),
            None => quantity.to_string(),
        })
    }

    /// The row as one entry of the comma-joined generation request.
    pub fn request_entry(&self) -> String {
        let mut entry = match self.quantity_text() {
            Some(quantity) => format!("{} {}", quantity, self.name.trim()),
            None => self.name.trim().to_string(),
        };
        if let Some(hint) = self.preferences.hint() {
            entry.push(' ');
            entry.push_str(&hint);
        }
        entry
    }
}

/// Form state: ordered rows (insertion order), allergy text, strict mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientForm {
    rows: Vec<IngredientRow>,
    pub allergies: String,
    pub strict_mode: bool,
}

impl Default for IngredientForm {
    fn default() -> Self {
        Self {
            rows: vec![IngredientRow::blank()],
            allergies: String::new(),
            strict_mode: false,
        }
    }
}

impl IngredientForm {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            ..Self::default()
        }
    }

    pub fn from_rows(rows: Vec<IngredientRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[IngredientRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a blank row and returns its id.
    pub fn add_row(&mut self) -> RowId {
        self.push_row(IngredientRow::blank())
    }

    pub fn push_row(&mut self, row: IngredientRow) -> RowId {
        let id = row.id;
        self.rows.push(row);
        id
    }

    /// Removes the row at `index`; later rows shift down one position.
    pub fn remove_row(&mut self, index: usize) -> Result<IngredientRow, FormError> {
        self.check_index(index)?;
        Ok(self.rows.remove(index))
    }

    pub fn index_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn row_by_id(&self, id: RowId) -> Option<&IngredientRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn set_name(&mut self, index: usize, name: &str) -> Result<(), FormError> {
        self.replace_row(index, |row| IngredientRow {
            name: name.to_string(),
            ..row.clone()
        })
    }

    pub fn set_quantity(&mut self, index: usize, quantity: &str) -> Result<(), FormError> {
        self.replace_row(index, |row| IngredientRow {
            quantity: quantity.to_string(),
            ..row.clone()
        })
    }

    pub fn set_unit(&mut self, index: usize, unit: Option<&str>) -> Result<(), FormError> {
        self.replace_row(index, |row| IngredientRow {
            unit: unit.map(str::to_string),
            ..row.clone()
        })
    }

    pub fn set_preference(
        &mut self,
        index: usize,
        preference: Preference,
        value: Option<u8>,
    ) -> Result<(), FormError> {
        self.check_index(index)?;
        let updated = self.rows[index].clone().with_preference(preference, value)?;
        self.rows[index] = updated;
        Ok(())
    }

    // Edits are keyed by position and swap in a fresh row, never mutate a
    // row matched by name.
    fn replace_row(
        &mut self,
        index: usize,
        edit: impl FnOnce(&IngredientRow) -> IngredientRow,
    ) -> Result<(), FormError> {
        self.check_index(index)?;
        let updated = edit(&self.rows[index]);
        self.rows[index] = updated;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), FormError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(FormError::RowOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }

    /// Serializes the non-blank rows into the generation request.
    pub fn to_recipe_request(&self) -> Result<RecipeRequest, FormError> {
        let entries: Vec<String> = self
            .rows
            .iter()
            .filter(|row| !row.is_blank())
            .map(IngredientRow::request_entry)
            .collect();
        if entries.is_empty() {
            return Err(FormError::NoIngredients);
        }
        let allergies = self.allergies.trim();
        Ok(RecipeRequest {
            ingredients: entries.join(", "),
            allergies: (!allergies.is_empty()).then(|| allergies.to_string()),
            strict_mode: Some(self.strict_mode),
        })
    }
}

/// A generated-recipe ingredient paired with the quantity it will be analysed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedIngredient {
    pub name: String,
    pub quantity: String,
    /// The form row the quantity came from, if any.
    pub row: Option<RowId>,
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// Words that describe preparation rather than the food itself.
const DESCRIPTORS: &[&str] = &[
    "fresh", "chopped", "diced", "sliced", "minced", "cooked", "raw", "large", "small",
    "medium", "whole", "ground", "boneless", "skinless", "frozen", "dried", "grated",
    "gram", "grams", "cup", "cups", "tbsp", "tsp", "piece", "pieces", "and", "the", "with",
];

/// Whole, plural-folded words naming the food in an ingredient entry.
///
/// `"2 cups cooked Peas"` → `{"pea"}`. Substrings never count, so "oil" is
/// not a word of "boiled rice".
pub fn ingredient_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphabetic())
        .map(str::to_lowercase)
        .map(|w| w.trim_end_matches('s').to_string())
        .filter(|w| w.len() > 2 && !DESCRIPTORS.contains(&w.as_str()))
        .collect()
}

/// Pairs each recipe ingredient with a user-entered row.
///
/// Every row is claimed at most once. Exact (normalised) names are matched
/// first. The rest are paired by shared [`ingredient_words`], strongest
/// overlap first, ties going to the earlier ingredient and then the earlier
/// row. Two recipe ingredients with the same name therefore take two
/// different rows in order, and a recipe ingredient left without a row falls
/// back to [`DEFAULT_QUANTITY`].
pub fn reassociate_quantities(
    recipe_ingredients: &[String],
    rows: &[IngredientRow],
) -> Vec<AssociatedIngredient> {
    let mut claimed = vec![false; rows.len()];
    let mut matches: Vec<Option<usize>> = vec![None; recipe_ingredients.len()];

    let row_names: Vec<String> = rows.iter().map(|row| normalize(&row.name)).collect();
    for (slot, ingredient) in matches.iter_mut().zip(recipe_ingredients) {
        let wanted = normalize(ingredient);
        let found = row_names
            .iter()
            .enumerate()
            .position(|(i, name)| !claimed[i] && !name.is_empty() && *name == wanted);
        if let Some(i) = found {
            claimed[i] = true;
            *slot = Some(i);
        }
    }

    let row_words: Vec<HashSet<String>> = rows.iter().map(|row| ingredient_words(&row.name)).collect();
    // (shared words, ingredient index, row index)
    let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
    for (i, ingredient) in recipe_ingredients.iter().enumerate() {
        if matches[i].is_some() {
            continue;
        }
        let words = ingredient_words(ingredient);
        for (r, candidate) in row_words.iter().enumerate() {
            let shared = words.intersection(candidate).count();
            if !claimed[r] && shared > 0 {
                candidates.push((shared, i, r));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    for (_, i, r) in candidates {
        if matches[i].is_none() && !claimed[r] {
            claimed[r] = true;
            matches[i] = Some(r);
        }
    }

    recipe_ingredients
        .iter()
        .zip(matches)
        .map(|(name, matched)| {
            let row = matched.map(|i| &rows[i]);
            AssociatedIngredient {
                name: name.clone(),
                quantity: row
                    .and_then(IngredientRow::quantity_text)
                    .unwrap_or_else(|| DEFAULT_QUANTITY.to_string()),
                row: row.map(|r| r.id),
            }
        })
        .collect()
}

/// Quantities for the generated recipe's ingredients, edited by position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuantitySheet {
    entries: Vec<AssociatedIngredient>,
}

impl QuantitySheet {
    pub fn new(recipe: &Recipe, form: &IngredientForm) -> Self {
        Self {
            entries: reassociate_quantities(&recipe.ingredients, form.rows()),
        }
    }

    pub fn entries(&self) -> &[AssociatedIngredient] {
        &self.entries
    }

    pub fn set_quantity(&mut self, index: usize, quantity: &str) -> Result<(), FormError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(FormError::RowOutOfRange { index, len })?;
        entry.quantity = quantity.trim().to_string();
        Ok(())
    }

    pub fn to_request(&self, recipe_name: &str) -> NutrientAnalysisRequest {
        NutrientAnalysisRequest {
            recipe_name: recipe_name.to_string(),
            ingredients: self
                .entries
                .iter()
                .map(|entry| IngredientQuantity {
                    name: entry.name.clone(),
                    quantity: if entry.quantity.is_empty() {
                        DEFAULT_QUANTITY.to_string()
                    } else {
                        entry.quantity.clone()
                    },
                })
                .collect(),
        }
    }
}
