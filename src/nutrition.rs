//! Defensive arithmetic over the model's free-form nutrient amounts.
//!
//! Amounts arrive as strings such as `"12"`, `"12g"`, `"12.5 mg"` or
//! `"about 1,200 mg"`. Everything here degrades to zero instead of failing,
//! since the values only feed bars and meters.

use regex::Regex;
use std::sync::OnceLock;

use crate::schema::{NutrientInfo, RecipeNutrientAnalysis};

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<a>\d*\.?\d+)(?:\s*(?:-|–|to)\s*(?P<b>\d*\.?\d+))?")
            .expect("amount pattern is valid")
    })
}

fn thousands_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d),(\d{3})").expect("thousands pattern is valid"))
}

/// Parses a nutrient amount into a finite, non-negative number; 0 when unparsable.
///
/// A range such as `"10-12 g"` yields its midpoint.
pub fn parse_amount(raw: &str) -> f64 {
    let text = raw.trim();
    if text.starts_with('-') {
        return 0.0;
    }
    let text = thousands_regex().replace_all(text, "$1$2");
    let Some(caps) = amount_regex().captures(&text) else {
        return 0.0;
    };
    let first = caps.name("a").and_then(|m| m.as_str().parse::<f64>().ok());
    let second = caps.name("b").and_then(|m| m.as_str().parse::<f64>().ok());
    let value = match (first, second) {
        (Some(a), Some(b)) => (a + b) / 2.0,
        (Some(a), None) => a,
        _ => 0.0,
    };
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

/// The unit written after the number inside an amount string (`"12.5 mg"` → `"mg"`).
pub fn embedded_unit(raw: &str) -> Option<String> {
    let text = thousands_regex().replace_all(raw.trim(), "$1$2");
    let end = amount_regex().find(&text)?.end();
    let unit: String = text[end..]
        .trim()
        .chars()
        .take_while(|c| c.is_alphabetic() || *c == 'µ')
        .collect();
    (!unit.is_empty()).then(|| unit.to_lowercase())
}

/// Effective unit of a nutrient: the explicit field, else whatever trails the amount.
pub fn unit_of(info: &NutrientInfo) -> Option<String> {
    let explicit = info.unit.trim();
    if explicit.is_empty() {
        embedded_unit(&info.amount)
    } else {
        Some(explicit.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MassUnit {
    Gram,
    Milligram,
    Microgram,
}

impl MassUnit {
    fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" | "gr" => Some(Self::Gram),
            "mg" | "milligram" | "milligrams" => Some(Self::Milligram),
            "mcg" | "µg" | "ug" | "microgram" | "micrograms" => Some(Self::Microgram),
            _ => None,
        }
    }

    fn in_micrograms(self) -> f64 {
        match self {
            Self::Gram => 1_000_000.0,
            Self::Milligram => 1_000.0,
            Self::Microgram => 1.0,
        }
    }
}

/// Converts between g / mg / mcg; `None` when either unit is not a mass unit.
pub fn convert_mass(value: f64, from: &str, to: &str) -> Option<f64> {
    let from = MassUnit::parse(from)?;
    let to = MassUnit::parse(to)?;
    Some(value * from.in_micrograms() / to.in_micrograms())
}

/// Reference daily value for adults on a 2,000 kcal diet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyValue {
    pub key: &'static str,
    pub amount: f64,
    pub unit: &'static str,
    aliases: &'static [&'static str],
}

// Specific names first so "saturated fat" is not read as "fat".
const DAILY_VALUES: &[DailyValue] = &[
    DailyValue { key: "calories", amount: 2000.0, unit: "kcal", aliases: &["calories", "energy", "kcal"] },
    DailyValue { key: "saturated fat", amount: 20.0, unit: "g", aliases: &["saturated fat", "saturated"] },
    DailyValue { key: "fiber", amount: 28.0, unit: "g", aliases: &["fiber", "fibre", "dietary fiber"] },
    DailyValue { key: "sugar", amount: 50.0, unit: "g", aliases: &["sugar", "sugars", "added sugars"] },
    DailyValue { key: "protein", amount: 50.0, unit: "g", aliases: &["protein"] },
    DailyValue { key: "carbohydrates", amount: 275.0, unit: "g", aliases: &["carbohydrate", "carbohydrates", "carbs", "total carbohydrate"] },
    DailyValue { key: "fat", amount: 78.0, unit: "g", aliases: &["fat", "total fat", "fats"] },
    DailyValue { key: "cholesterol", amount: 300.0, unit: "mg", aliases: &["cholesterol"] },
    DailyValue { key: "sodium", amount: 2300.0, unit: "mg", aliases: &["sodium"] },
    DailyValue { key: "potassium", amount: 4700.0, unit: "mg", aliases: &["potassium"] },
    DailyValue { key: "calcium", amount: 1300.0, unit: "mg", aliases: &["calcium"] },
    DailyValue { key: "iron", amount: 18.0, unit: "mg", aliases: &["iron"] },
    DailyValue { key: "magnesium", amount: 420.0, unit: "mg", aliases: &["magnesium"] },
    DailyValue { key: "zinc", amount: 11.0, unit: "mg", aliases: &["zinc"] },
    DailyValue { key: "vitamin a", amount: 900.0, unit: "mcg", aliases: &["vitamin a"] },
    DailyValue { key: "vitamin b12", amount: 2.4, unit: "mcg", aliases: &["vitamin b12", "b12", "cobalamin"] },
    DailyValue { key: "vitamin c", amount: 90.0, unit: "mg", aliases: &["vitamin c", "ascorbic acid"] },
    DailyValue { key: "vitamin d", amount: 20.0, unit: "mcg", aliases: &["vitamin d"] },
    DailyValue { key: "vitamin k", amount: 120.0, unit: "mcg", aliases: &["vitamin k"] },
    DailyValue { key: "folate", amount: 400.0, unit: "mcg", aliases: &["folate", "folic acid"] },
];

fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(['(', ')'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks up the reference daily value for a nutrient name.
pub fn daily_value(name: &str) -> Option<&'static DailyValue> {
    let name = normalize_name(name);
    if name.contains("unsaturated") {
        return None;
    }
    DAILY_VALUES
        .iter()
        .find(|dv| dv.aliases.iter().any(|alias| *alias == name))
        .or_else(|| {
            DAILY_VALUES
                .iter()
                .find(|dv| dv.aliases.iter().any(|alias| name.contains(alias)))
        })
}

/// Percent of the daily value this nutrient covers, `None` when no reference
/// exists or the units cannot be reconciled.
pub fn daily_percent(info: &NutrientInfo) -> Option<f64> {
    let dv = daily_value(&info.name)?;
    let value = info.value();
    let amount_in_dv_unit = if dv.unit == "kcal" {
        value
    } else {
        match unit_of(info) {
            Some(unit) => convert_mass(value, &unit, dv.unit)?,
            None => value,
        }
    };
    Some(amount_in_dv_unit / dv.amount * 100.0)
}

/// Amount of the named nutrient in `list`, 0 when absent.
///
/// Exact (case-insensitive) names win; otherwise names sharing a daily-value
/// entry match, so `"carbs"` finds `"Carbohydrates"`.
pub fn nutrient_amount(list: &[NutrientInfo], name: &str) -> f64 {
    find_nutrient(list, name).map(NutrientInfo::value).unwrap_or(0.0)
}

pub fn find_nutrient<'a>(list: &'a [NutrientInfo], name: &str) -> Option<&'a NutrientInfo> {
    let wanted = normalize_name(name);
    list.iter()
        .find(|info| normalize_name(&info.name) == wanted)
        .or_else(|| {
            let dv = daily_value(name)?;
            let same_entry =
                |info: &&NutrientInfo| daily_value(&info.name).map(|d| d.key) == Some(dv.key);
            // "Total Fat" beats "Trans Fat" even though both read as fat.
            list.iter()
                .filter(&same_entry)
                .find(|info| dv.aliases.contains(&normalize_name(&info.name).as_str()))
                .or_else(|| list.iter().find(&same_entry))
        })
}

/// Amount of a nutrient expressed in grams, 0 when absent or not a mass.
///
/// A bare number is read in the nutrient's daily-value unit, the same way
/// [`daily_percent`] reads it.
pub fn nutrient_grams(list: &[NutrientInfo], name: &str) -> f64 {
    let Some(info) = find_nutrient(list, name) else {
        return 0.0;
    };
    let unit = unit_of(info)
        .or_else(|| daily_value(&info.name).map(|dv| dv.unit.to_string()))
        .unwrap_or_else(|| "g".to_string());
    convert_mass(info.value(), &unit, "g").unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthRating {
    Wholesome,
    Balanced,
    Indulgent,
}

impl HealthRating {
    pub fn label(self) -> &'static str {
        match self {
            Self::Wholesome => "Wholesome",
            Self::Balanced => "Balanced",
            Self::Indulgent => "Indulgent",
        }
    }
}

/// 0–100 healthiness gauge derived from the recipe totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthMeter {
    pub score: f64,
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
}

impl HealthMeter {
    /// Scores the macro split against the 10–35 / 45–65 / 20–35 % calorie
    /// ranges and penalises sugar, sodium and saturated fat above their
    /// daily values. Fiber earns a small bonus.
    pub fn from_analysis(analysis: &RecipeNutrientAnalysis) -> Self {
        let macros = &analysis.macronutrients;
        let all: Vec<NutrientInfo> = macros
            .iter()
            .chain(analysis.micronutrients.iter())
            .cloned()
            .collect();

        let protein_kcal = nutrient_grams(macros, "protein") * 4.0;
        let carbs_kcal = nutrient_grams(macros, "carbohydrates") * 4.0;
        let fat_kcal = nutrient_grams(macros, "fat") * 9.0;
        let macro_kcal = protein_kcal + carbs_kcal + fat_kcal;

        let share = |kcal: f64| if macro_kcal > 0.0 { kcal / macro_kcal * 100.0 } else { 0.0 };
        let (protein_pct, carbs_pct, fat_pct) = (share(protein_kcal), share(carbs_kcal), share(fat_kcal));

        let mut score = 100.0;
        if macro_kcal > 0.0 {
            score -= range_penalty(protein_pct, 10.0, 35.0);
            score -= range_penalty(carbs_pct, 45.0, 65.0);
            score -= range_penalty(fat_pct, 20.0, 35.0);
        } else {
            score -= 30.0;
        }

        for (name, limit) in [("sugar", 50.0), ("saturated fat", 20.0)] {
            let grams = nutrient_grams(&all, name);
            if grams > limit {
                score -= ((grams - limit) / limit * 20.0).min(20.0);
            }
        }
        let sodium_mg = nutrient_grams(&all, "sodium") * 1000.0;
        if sodium_mg > 2300.0 {
            score -= ((sodium_mg - 2300.0) / 2300.0 * 20.0).min(20.0);
        }
        score += (nutrient_grams(&all, "fiber") / 28.0 * 10.0).min(10.0);

        Self {
            score: score.clamp(0.0, 100.0),
            protein_pct,
            carbs_pct,
            fat_pct,
        }
    }

    pub fn rating(&self) -> HealthRating {
        if self.score >= 75.0 {
            HealthRating::Wholesome
        } else if self.score >= 50.0 {
            HealthRating::Balanced
        } else {
            HealthRating::Indulgent
        }
    }
}

// One point per percentage point outside [low, high], capped at 25.
fn range_penalty(value: f64, low: f64, high: f64) -> f64 {
    let distance = if value < low {
        low - value
    } else if value > high {
        value - high
    } else {
        0.0
    };
    distance.min(25.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, amount: &str, unit: &str) -> NutrientInfo {
        NutrientInfo {
            name: name.to_string(),
            amount: amount.to_string(),
            unit: unit.to_string(),
        }
    }

    #[test]
    fn parses_plain_suffixed_and_spaced_amounts() {
        assert_eq!(parse_amount("12"), 12.0);
        assert_eq!(parse_amount("12g"), 12.0);
        assert_eq!(parse_amount("12.5 mg"), 12.5);
        assert_eq!(parse_amount(".5"), 0.5);
    }

    #[test]
    fn parses_decorated_amounts() {
        assert_eq!(parse_amount("~12"), 12.0);
        assert_eq!(parse_amount("about 1,200 mg"), 1200.0);
        assert_eq!(parse_amount("10-12 g"), 11.0);
        assert_eq!(parse_amount("2 to 4"), 3.0);
    }

    #[test]
    fn unparsable_amounts_are_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("trace"), 0.0);
        assert_eq!(parse_amount("N/A"), 0.0);
        assert_eq!(parse_amount("-5 g"), 0.0);
    }

    #[test]
    fn embedded_units_are_found() {
        assert_eq!(embedded_unit("12.5 mg").as_deref(), Some("mg"));
        assert_eq!(embedded_unit("40g").as_deref(), Some("g"));
        assert_eq!(embedded_unit("12"), None);
        assert_eq!(unit_of(&info("Iron", "2mg", "")).as_deref(), Some("mg"));
        assert_eq!(unit_of(&info("Iron", "2", "MG")).as_deref(), Some("mg"));
    }

    #[test]
    fn mass_conversion() {
        assert_eq!(convert_mass(1.5, "g", "mg"), Some(1500.0));
        assert_eq!(convert_mass(500.0, "mcg", "mg"), Some(0.5));
        assert_eq!(convert_mass(1.0, "IU", "mg"), None);
    }

    #[test]
    fn daily_value_prefers_specific_names() {
        assert_eq!(daily_value("Saturated Fat").map(|dv| dv.key), Some("saturated fat"));
        assert_eq!(daily_value("Total Fat").map(|dv| dv.key), Some("fat"));
        assert_eq!(daily_value("Vitamin C (Ascorbic Acid)").map(|dv| dv.key), Some("vitamin c"));
        assert!(daily_value("Lycopene").is_none());
        assert!(daily_value("Monounsaturated Fat").is_none());
    }

    #[test]
    fn daily_percent_converts_units() {
        let sodium = info("Sodium", "1.15", "g");
        let percent = daily_percent(&sodium).unwrap();
        assert!((percent - 50.0).abs() < 1e-9);

        let protein = info("Protein", "25g", "");
        assert_eq!(daily_percent(&protein), Some(50.0));

        assert_eq!(daily_percent(&info("Vitamin A", "300", "IU")), None);
        assert_eq!(daily_percent(&info("Lycopene", "3", "mg")), None);
    }

    #[test]
    fn missing_nutrients_degrade_to_zero() {
        let list = vec![info("Carbohydrates", "40", "g"), info("Protein", "oops", "g")];
        assert_eq!(nutrient_amount(&list, "carbs"), 40.0);
        assert_eq!(nutrient_amount(&list, "Protein"), 0.0);
        assert_eq!(nutrient_amount(&list, "Fiber"), 0.0);
        assert_eq!(nutrient_amount(&[], "Fat"), 0.0);
    }

    #[test]
    fn health_meter_rewards_balanced_macros() {
        let balanced = RecipeNutrientAnalysis {
            recipe_name: "Bowl".to_string(),
            total_calories: 600.0,
            macronutrients: vec![
                info("Protein", "30", "g"),
                info("Carbohydrates", "75", "g"),
                info("Fat", "20", "g"),
                info("Fiber", "10", "g"),
            ],
            micronutrients: vec![info("Sodium", "600", "mg")],
            healthiness_assessment: String::new(),
        };
        let meter = HealthMeter::from_analysis(&balanced);
        assert!(meter.score >= 75.0, "score was {}", meter.score);
        assert_eq!(meter.rating(), HealthRating::Wholesome);

        let greasy = RecipeNutrientAnalysis {
            macronutrients: vec![
                info("Protein", "5", "g"),
                info("Carbohydrates", "20", "g"),
                info("Fat", "60", "g"),
                info("Saturated Fat", "35", "g"),
            ],
            micronutrients: vec![info("Sodium", "4600", "mg")],
            ..balanced
        };
        let meter = HealthMeter::from_analysis(&greasy);
        assert!(meter.score < 50.0, "score was {}", meter.score);
        assert_eq!(meter.rating(), HealthRating::Indulgent);
    }

    #[test]
    fn thousands_separators_do_not_hide_units() {
        assert_eq!(embedded_unit("1,200 mg").as_deref(), Some("mg"));
        assert_eq!(embedded_unit("about 2,500mcg").as_deref(), Some("mcg"));
        assert_eq!(unit_of(&info("Sodium", "1,200 mg", "")).as_deref(), Some("mg"));
    }

    #[test]
    fn bare_amounts_use_the_daily_value_unit() {
        let list = vec![
            info("Sodium", "600", ""),
            info("Potassium", "1,200 mg", ""),
            info("Protein", "30", ""),
        ];
        assert!((nutrient_grams(&list, "sodium") - 0.6).abs() < 1e-9);
        assert!((nutrient_grams(&list, "potassium") - 1.2).abs() < 1e-9);
        assert_eq!(nutrient_grams(&list, "protein"), 30.0);

        let sodium_percent = daily_percent(&list[0]).unwrap();
        let sodium_mg = nutrient_grams(&list, "sodium") * 1000.0;
        assert!((sodium_percent - sodium_mg / 2300.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn health_meter_reads_sodium_the_same_with_or_without_unit() {
        let with_unit = RecipeNutrientAnalysis {
            recipe_name: "Bowl".to_string(),
            total_calories: 600.0,
            macronutrients: vec![
                info("Protein", "30", "g"),
                info("Carbohydrates", "75", "g"),
                info("Fat", "20", "g"),
            ],
            micronutrients: vec![info("Sodium", "600", "mg")],
            healthiness_assessment: String::new(),
        };
        let unitless = RecipeNutrientAnalysis {
            micronutrients: vec![info("Sodium", "600", "")],
            ..with_unit.clone()
        };
        let separated = RecipeNutrientAnalysis {
            micronutrients: vec![info("Sodium", "1,200 mg", "")],
            ..with_unit.clone()
        };
        let expected = HealthMeter::from_analysis(&with_unit).score;
        assert_eq!(HealthMeter::from_analysis(&unitless).score, expected);
        assert_eq!(HealthMeter::from_analysis(&separated).score, expected);
    }

    #[test]
    fn total_fat_wins_over_trans_fat() {
        let list = vec![
            info("Trans Fat", "0.5", "g"),
            info("Total Fat", "18", "g"),
            info("Saturated Fat", "4", "g"),
        ];
        assert_eq!(find_nutrient(&list, "fat").map(|i| i.name.as_str()), Some("Total Fat"));
        assert_eq!(nutrient_grams(&list, "fat"), 18.0);

        let only_trans = vec![info("Trans Fat", "0.5", "g")];
        assert_eq!(find_nutrient(&only_trans, "fat").map(|i| i.name.as_str()), Some("Trans Fat"));
    }

    #[test]
    fn health_meter_without_macros_stays_in_range() {
        let empty = RecipeNutrientAnalysis {
            recipe_name: "Water".to_string(),
            total_calories: 0.0,
            macronutrients: vec![],
            micronutrients: vec![],
            healthiness_assessment: String::new(),
        };
        let meter = HealthMeter::from_analysis(&empty);
        assert!((0.0..=100.0).contains(&meter.score));
        assert_eq!(meter.protein_pct, 0.0);
    }
}
