use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::schema::Recipe;

/// Writes a recipe as pretty JSON so it can be analysed or cooked later.
pub async fn save_recipe(recipe: &Recipe, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(recipe).context("Failed to serialize recipe")?;
    fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write recipe file '{}'", path.display()))
}

pub async fn load_recipe(path: &Path) -> Result<Recipe> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recipe file '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("'{}' does not contain a recipe", path.display()))
}
