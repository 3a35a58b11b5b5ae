//! Terminal rendering. Every function is a pure projection of state to text.

use colored::Colorize;
use std::fmt::Write as _;

use crate::form::QuantitySheet;
use crate::nutrition::{daily_percent, HealthMeter, HealthRating};
use crate::schema::{NutrientAnalysisResult, NutrientInfo, Recipe};
use crate::timer::{StepProgress, TimerState};

pub const BAR_WIDTH: usize = 20;

/// A `█`/`░` bar for a 0–100 percentage; values outside are clamped.
pub fn render_bar(percent: f64, width: usize) -> String {
    let clamped = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_recipe(recipe: &Recipe, quantities: &QuantitySheet, steps: &[StepProgress]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", recipe.recipe_name.bold().underline());

    if let Some(warning) = recipe.allergy_warning() {
        let _ = writeln!(out, "{} {}", "Allergy warning:".red().bold(), warning.red());
    }

    let _ = writeln!(out, "\n{}", "Ingredients".bold());
    for (index, name) in recipe.ingredients.iter().enumerate() {
        match quantities.entries().get(index) {
            Some(entry) => {
                let _ = writeln!(out, "  {:>2}. {} ({})", index + 1, name, entry.quantity.dimmed());
            }
            None => {
                let _ = writeln!(out, "  {:>2}. {}", index + 1, name);
            }
        }
    }

    let _ = writeln!(out, "\n{}", "Instructions".bold());
    if steps.is_empty() {
        for (index, step) in recipe.instructions.iter().enumerate() {
            let _ = writeln!(out, "  [ ] {}. {}", index + 1, step.step);
        }
    } else {
        for (index, progress) in steps.iter().enumerate() {
            let _ = writeln!(out, "{}", render_step(index, progress));
        }
    }

    let alternates = recipe.alternates();
    if !alternates.is_empty() {
        let _ = writeln!(out, "\n{}", "Alternate recipes".bold());
        for alternate in alternates {
            let _ = writeln!(out, "  • {}: {}", alternate.name.italic(), alternate.description);
        }
    }
    out
}

/// One checklist line: checkbox, number, text and the timer (if any).
pub fn render_step(index: usize, progress: &StepProgress) -> String {
    let checkbox = if progress.checked { "[x]".green().to_string() } else { "[ ]".to_string() };
    let text = if progress.checked {
        progress.step.step.strikethrough().dimmed().to_string()
    } else {
        progress.step.step.clone()
    };
    let mut line = format!("  {} {}. {}", checkbox, index + 1, text);
    if let Some(timer) = &progress.timer {
        let shown = timer.to_string();
        let styled = match timer.state() {
            TimerState::Running => shown.yellow(),
            TimerState::Paused => shown.cyan(),
            TimerState::Completed => shown.green(),
            TimerState::Idle => shown.normal(),
        };
        let _ = write!(line, "  ⏱ {}", styled);
    }
    line
}

pub fn render_nutrient(info: &NutrientInfo) -> String {
    let amount = format!("{} {}", info.amount.trim(), info.unit.trim());
    match daily_percent(info) {
        Some(percent) => format!(
            "    {:<18} {:>12}  {} {:>5.0}% DV",
            info.name,
            amount.trim(),
            render_bar(percent, BAR_WIDTH),
            percent
        ),
        None => format!("    {:<18} {:>12}", info.name, amount.trim()),
    }
}

fn render_nutrient_list(out: &mut String, title: &str, list: &[NutrientInfo]) {
    let _ = writeln!(out, "  {}", title.bold());
    if list.is_empty() {
        let _ = writeln!(out, "    {}", "none reported".dimmed());
    }
    for info in list {
        let _ = writeln!(out, "{}", render_nutrient(info));
    }
}

pub fn render_health_meter(meter: &HealthMeter) -> String {
    let label = match meter.rating() {
        HealthRating::Wholesome => meter.rating().label().green(),
        HealthRating::Balanced => meter.rating().label().yellow(),
        HealthRating::Indulgent => meter.rating().label().red(),
    };
    format!(
        "  Health meter   {} {:>3.0}/100 {}\n  Calorie split  protein {:.0}% · carbs {:.0}% · fat {:.0}%",
        render_bar(meter.score, BAR_WIDTH),
        meter.score,
        label,
        meter.protein_pct,
        meter.carbs_pct,
        meter.fat_pct
    )
}

pub fn render_analysis(result: &NutrientAnalysisResult) -> String {
    let recipe = &result.recipe_analysis;
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Nutrient analysis:".bold().underline(), recipe.recipe_name.bold());
    let _ = writeln!(out, "  Total calories: {:.0} kcal", recipe.total_calories);
    let _ = writeln!(out, "{}", render_health_meter(&HealthMeter::from_analysis(recipe)));
    render_nutrient_list(&mut out, "Macronutrients", &recipe.macronutrients);
    render_nutrient_list(&mut out, "Micronutrients", &recipe.micronutrients);
    if !recipe.healthiness_assessment.trim().is_empty() {
        let _ = writeln!(out, "  {} {}", "Assessment:".bold(), recipe.healthiness_assessment.trim());
    }

    if !result.ingredient_analyses.is_empty() {
        let _ = writeln!(out, "\n{}", "Per ingredient".bold());
        for ingredient in &result.ingredient_analyses {
            let _ = writeln!(out, "  {}", ingredient.name.italic());
            render_nutrient_list(&mut out, "Macronutrients", &ingredient.macronutrients);
            render_nutrient_list(&mut out, "Micronutrients", &ingredient.micronutrients);
        }
    }
    out
}
