use anyhow::{bail, Context, Result};
use colored::Colorize;
use recipe_gen::api_connection::endpoints::Provider;
use recipe_gen::cli::{
    parse_args, parse_ingredient_spec, parse_quantity_override, AnalyzeArgs, Command, GenerateArgs,
};
use recipe_gen::config::AppConfig;
use recipe_gen::cook::{CookCommand, Kitchen, HELP};
use recipe_gen::flow::ModelSettings;
use recipe_gen::form::IngredientForm;
use recipe_gen::nutrient_analyzer::LlmNutrientOracle;
use recipe_gen::presentation::{render_analysis, render_recipe};
use recipe_gen::recipe_generator::LlmRecipeOracle;
use recipe_gen::recipe_store::{load_recipe, save_recipe};
use recipe_gen::session::{ConsoleNotifier, Session};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "recipe_gen=debug" } else { "recipe_gen=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_overrides(session: &mut Session, overrides: &[String]) -> Result<()> {
    for spec in overrides {
        let (index, quantity) = parse_quantity_override(spec)?;
        session
            .set_quantity(index, &quantity)
            .with_context(|| format!("Cannot apply quantity '{}'", spec))?;
    }
    Ok(())
}

async fn run_generate(args: GenerateArgs, provider: Provider, settings: ModelSettings) -> Result<()> {
    let rows = args
        .ingredients
        .iter()
        .map(|spec| parse_ingredient_spec(spec))
        .collect::<Result<Vec<_>>>()?;
    let mut form = IngredientForm::from_rows(rows);
    form.allergies = args.allergies.unwrap_or_default();
    form.strict_mode = args.strict;

    let mut session = Session::new(form);
    let notifier = ConsoleNotifier;
    let recipe_oracle = LlmRecipeOracle::new(provider.clone(), settings.clone());
    if !session.generate(&recipe_oracle, &notifier).await {
        bail!("No recipe was generated");
    }
    apply_overrides(&mut session, &args.quantities)?;

    let Some(recipe) = session.recipe() else {
        bail!("No recipe was generated");
    };
    if let Some(path) = &args.save {
        save_recipe(recipe, path).await?;
        println!("Saved recipe to {}", path.display());
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
    } else {
        println!("{}", render_recipe(recipe, session.quantities(), session.steps()));
    }

    if args.analyze {
        let nutrient_oracle = LlmNutrientOracle::new(provider, settings);
        if session.analyze(&nutrient_oracle, &notifier).await {
            if let Some(analysis) = session.analysis() {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(analysis)?);
                } else {
                    println!("{}", render_analysis(analysis));
                }
            }
        }
    }
    Ok(())
}

async fn run_analyze(args: AnalyzeArgs, provider: Provider, settings: ModelSettings) -> Result<()> {
    let recipe = load_recipe(&args.recipe).await?;
    let mut session = Session::new(IngredientForm::empty());
    session.load_recipe(recipe);
    apply_overrides(&mut session, &args.quantities)?;

    let notifier = ConsoleNotifier;
    let oracle = LlmNutrientOracle::new(provider, settings);
    if !session.analyze(&oracle, &notifier).await {
        bail!("Nutrient analysis failed");
    }
    if let Some(analysis) = session.analysis() {
        if args.json {
            println!("{}", serde_json::to_string_pretty(analysis)?);
        } else {
            println!("{}", render_analysis(analysis));
        }
    }
    Ok(())
}

async fn run_cook(path: &Path) -> Result<()> {
    let recipe = load_recipe(path).await?;
    let (elapsed_tx, mut elapsed_rx) = mpsc::unbounded_channel();
    let mut kitchen = Kitchen::new(&recipe, elapsed_tx);

    println!("{}\n{}\n{}", recipe.recipe_name.bold().underline(), kitchen.render(), HELP.dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(step) = elapsed_rx.recv() => {
                println!("{} step {} timer is up!", "⏰".yellow(), step);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match CookCommand::parse(&line) {
                    Some(CookCommand::Quit) => break,
                    Some(command) => println!("{}", kitchen.apply(command)),
                    None => println!("unknown command. {}", HELP),
                }
                if kitchen.all_checked() {
                    println!("{}", "All steps done. Enjoy your meal!".green().bold());
                    break;
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env file for API keys

    let cli_args = parse_args();
    init_logging(cli_args.verbose);

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(model) = cli_args.model {
        config.model = model;
    }
    let provider = Provider::from_config(&config);
    let settings = ModelSettings::from(&config);

    match cli_args.command {
        Command::Generate(args) => run_generate(args, provider, settings).await,
        Command::Analyze(args) => run_analyze(args, provider, settings).await,
        Command::Cook { recipe } => run_cook(&recipe).await,
        Command::Models => {
            for model in provider.get_available_models() {
                let marker = if model.model_name == config.model { "*" } else { " " };
                println!("{} {} ({})", marker, model.model_name, model.model_source);
            }
            Ok(())
        }
    }
}
