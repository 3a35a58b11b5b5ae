use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::form::{IngredientRow, Preference};

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn what is in your fridge into a recipe, then check its nutrients", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Model to use (overrides RECIPE_GEN_MODEL)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Log debug output, including raw model responses
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a recipe from ingredients
    Generate(GenerateArgs),
    /// Analyze the nutrients of a saved recipe
    Analyze(AnalyzeArgs),
    /// Walk through a saved recipe's steps with timers
    Cook {
        /// Path to a recipe JSON file written by `generate --save`
        #[arg(short, long)]
        recipe: PathBuf,
    },
    /// List the models known to work well
    Models,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Ingredient as NAME[:QUANTITY[:UNIT[:PREFS]]], repeatable (e.g. -i chicken:200:gram,
    /// -i tofu:::protein=80,fat=20). PREFS are 0-100 sliders for protein, carbs and fat.
    #[arg(short = 'i', long = "ingredient", required = true)]
    pub ingredients: Vec<String>,

    /// Comma-separated allergies to avoid
    #[arg(short, long)]
    pub allergies: Option<String>,

    /// Forbid ingredients that were not supplied
    #[arg(long)]
    pub strict: bool,

    /// Run the nutrient analysis on the generated recipe
    #[arg(long)]
    pub analyze: bool,

    /// Quantity override for the generated recipe's ingredient, as N=QUANTITY (1-based)
    #[arg(short = 'q', long = "quantity")]
    pub quantities: Vec<String>,

    /// Save the generated recipe to this JSON file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Print JSON instead of the formatted card
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to a recipe JSON file written by `generate --save`
    #[arg(short, long)]
    pub recipe: PathBuf,

    /// Quantity for the recipe's ingredient, as N=QUANTITY (1-based)
    #[arg(short = 'q', long = "quantity")]
    pub quantities: Vec<String>,

    /// Print JSON instead of the formatted breakdown
    #[arg(long)]
    pub json: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// `"chicken:200:gram"` → row named chicken, quantity 200, unit gram.
/// A fourth field sets sliders: `"tofu:::protein=80,fat=20"`.
pub fn parse_ingredient_spec(spec: &str) -> Result<IngredientRow> {
    let mut parts = spec.splitn(4, ':').map(str::trim);
    let name = parts.next().filter(|n| !n.is_empty());
    let Some(name) = name else {
        return Err(anyhow!("ingredient '{}' has no name", spec));
    };
    let quantity = parts.next().unwrap_or("");
    let unit = parts.next();
    let mut row = IngredientRow::named(name).with_quantity(quantity, unit);
    for pref in parts.next().unwrap_or("").split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pref
            .split_once('=')
            .ok_or_else(|| anyhow!("preference '{}' must look like protein=80", pref))?;
        let preference = Preference::parse(key)
            .ok_or_else(|| anyhow!("unknown preference '{}' (protein, carbs or fat)", key.trim()))?;
        let value: u8 = value
            .trim()
            .parse()
            .map_err(|_| anyhow!("preference '{}' needs a value from 0 to 100", pref))?;
        row = row.with_preference(preference, Some(value))?;
    }
    Ok(row)
}

/// `"2=150g"` → (1, "150g"); positions are 1-based on the command line.
pub fn parse_quantity_override(spec: &str) -> Result<(usize, String)> {
    let (position, quantity) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("quantity '{}' must look like N=QUANTITY", spec))?;
    let position: usize = position
        .trim()
        .parse()
        .map_err(|_| anyhow!("'{}' is not an ingredient number", position.trim()))?;
    let index = position
        .checked_sub(1)
        .ok_or_else(|| anyhow!("ingredient numbers start at 1"))?;
    Ok((index, quantity.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_specs() {
        let row = parse_ingredient_spec("chicken:200:gram").unwrap();
        assert_eq!(row.name, "chicken");
        assert_eq!(row.quantity_text().as_deref(), Some("200 gram"));

        let row = parse_ingredient_spec(" broccoli ").unwrap();
        assert_eq!(row.name, "broccoli");
        assert_eq!(row.quantity_text(), None);

        let row = parse_ingredient_spec("eggs:3").unwrap();
        assert_eq!(row.quantity_text().as_deref(), Some("3"));

        assert!(parse_ingredient_spec(":200:g").is_err());
    }

    #[test]
    fn ingredient_specs_carry_sliders() {
        let row = parse_ingredient_spec("tofu:::protein=80, fat=20").unwrap();
        assert_eq!(row.name, "tofu");
        assert_eq!(row.quantity_text(), None);
        assert_eq!(row.preferences.get(Preference::Protein), Some(80));
        assert_eq!(row.preferences.get(Preference::Fat), Some(20));
        assert_eq!(row.preferences.get(Preference::Carbs), None);
        assert_eq!(row.request_entry(), "tofu [protein 80, fat 20]");

        let row = parse_ingredient_spec("rice:1:cup:Carbs=60").unwrap();
        assert_eq!(row.request_entry(), "1 cup rice [carbs 60]");

        assert!(parse_ingredient_spec("tofu:::protein=120").is_err());
        assert!(parse_ingredient_spec("tofu:::sugar=10").is_err());
        assert!(parse_ingredient_spec("tofu:::protein").is_err());
    }

    #[test]
    fn quantity_overrides() {
        assert_eq!(parse_quantity_override("2=150 g").unwrap(), (1, "150 g".to_string()));
        assert!(parse_quantity_override("0=1").is_err());
        assert!(parse_quantity_override("rice=1").is_err());
        assert!(parse_quantity_override("150g").is_err());
    }

    #[test]
    fn generate_command_parses() {
        let cli = Cli::try_parse_from([
            "recipe_gen", "generate", "-i", "chicken:200:gram", "-i", "rice", "--strict",
            "--allergies", "nuts", "--analyze", "-q", "1=250g",
        ])
        .unwrap();
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.ingredients, vec!["chicken:200:gram", "rice"]);
                assert!(args.strict && args.analyze);
                assert_eq!(args.allergies.as_deref(), Some("nuts"));
                assert_eq!(args.quantities, vec!["1=250g"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn generate_requires_an_ingredient() {
        assert!(Cli::try_parse_from(["recipe_gen", "generate"]).is_err());
    }
}
