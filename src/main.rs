use anyhow::{Context, Result};
use serde::Serialize;

use recipe_advisor::ai_client::AiClient;
use recipe_advisor::catalog::RecipeCatalog;
use recipe_advisor::cli::{parse_args, Cli, Command};
use recipe_advisor::config::AdvisorConfig;
use recipe_advisor::context::{disease_label, RequestContextBuilder};
use recipe_advisor::error::{AdvisorError, ErrorKind, ErrorReport};
use recipe_advisor::favorites::SavedRecipes;
use recipe_advisor::meal_planner::MealPlanner;
use recipe_advisor::models::{CatalogRecipe, GeneratedRecipe, MealPlan, RecipeView};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_catalog_recipe(recipe: &CatalogRecipe) {
    println!(
        "{} {}  ({} kcal, P {} / C {} / F {})",
        recipe.icon, recipe.name, recipe.calories, recipe.protein, recipe.carbs, recipe.fat
    );
    println!("   {}", recipe.description);
    println!("   Ingredients: {}", recipe.ingredients.join(", "));
}

fn print_generated_recipe(recipe: &GeneratedRecipe) {
    println!(
        "{} {}  ({} kcal, P {}g / C {}g / F {}g)",
        recipe.icon, recipe.name, recipe.calories, recipe.protein, recipe.carbs, recipe.fat
    );
    println!("   Why: {}", recipe.reason);
    for ingredient in &recipe.modified_ingredients {
        println!("   - {}", ingredient);
    }
    for (i, step) in recipe.instructions.iter().enumerate() {
        println!("   {}. {}", i + 1, step);
    }
}

fn print_meal_plan(plan: &MealPlan) {
    println!("{}\n{}\n", plan.title, plan.reason);
    for day in &plan.plan {
        println!("{} {}", day.icon, day.day);
        for meal in &day.meals {
            println!("   [{}] {}  {}", meal.time, meal.menu, meal.note);
        }
    }
}

/// Turns library errors into something an operator can act on.
fn report(err: AdvisorError) -> anyhow::Error {
    let report = ErrorReport::from(&err);
    if let Some(raw) = err.raw_response() {
        tracing::debug!(raw, "offending AI response");
    }
    anyhow::Error::new(err).context(format!("request failed ({})", report.code))
}

/// Machine-readable form of a failed command, for `--json` callers.
fn error_report(err: &anyhow::Error) -> ErrorReport {
    if let Some(advisor) = err.downcast_ref::<AdvisorError>() {
        return ErrorReport::from(advisor);
    }
    let code = if err.downcast_ref::<std::io::Error>().is_some() {
        ErrorKind::Storage.code()
    } else {
        ErrorKind::InvalidInput.code()
    };
    ErrorReport {
        message: format!("{:#}", err),
        code,
        attempts: None,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let catalog = RecipeCatalog::bundled().context("Failed to load the bundled recipe catalog")?;

    match cli.command {
        Command::Search { query } => {
            let recipes = match query.as_deref() {
                Some(q) if !q.trim().is_empty() => catalog.search(q),
                _ => catalog.recipes_for(&cli.conditions),
            };
            if cli.json {
                return print_json(&recipes);
            }
            if recipes.is_empty() {
                println!("No catalog recipes match. Try `recipes --query ...` to generate some.");
            }
            recipes.into_iter().for_each(print_catalog_recipe);
        }
        Command::Recipes { query } => {
            let client = AiClient::new(AdvisorConfig::from_env());
            let context = RequestContextBuilder::new(&cli.conditions, &cli.avoid)
                .query(query)
                .build();
            let recipes = client.generate_recipes(&context).await.map_err(report)?;
            if cli.json {
                return print_json(&recipes);
            }
            println!("{} recipes generated for {}\n", recipes.len(), context.disease);
            recipes.iter().for_each(print_generated_recipe);
        }
        Command::Modify { recipe } => {
            let original = catalog
                .find(&recipe)
                .with_context(|| format!("Recipe '{}' is not in the catalog", recipe))?;
            let client = AiClient::new(AdvisorConfig::from_env());
            let modified = client
                .modify_ingredients(&disease_label(&cli.conditions), original)
                .await
                .map_err(report)?;
            if cli.json {
                return print_json(&modified);
            }
            println!("{} (adapted)", modified.name);
            println!("   Why: {}", modified.reason);
            for ingredient in &modified.modified_ingredients {
                println!("   - {}", ingredient);
            }
        }
        Command::Plan {
            period,
            meal_prep,
            weeks,
        } => {
            let client = AiClient::new(AdvisorConfig::from_env());
            let mut planner = MealPlanner::new();
            planner
                .generate(&client, &cli.conditions, &cli.avoid, period.into(), meal_prep)
                .await
                .map_err(report)?;
            for _ in 1..weeks {
                if !planner.can_load_more() {
                    break;
                }
                planner.load_next_week(&client).await.map_err(report)?;
            }
            let plan = planner.plan().context("No meal plan was produced")?;
            if cli.json {
                return print_json(plan);
            }
            print_meal_plan(plan);
        }
        Command::Save { recipe, tag } => {
            let found = catalog
                .find(&recipe)
                .with_context(|| format!("Recipe '{}' is not in the catalog", recipe))?;
            let mut saved = SavedRecipes::load(&cli.favorites)
                .await
                .with_context(|| format!("Failed to read '{}'", cli.favorites.display()))?;
            let now_saved = saved.toggle(RecipeView::Catalog(found.clone()));
            if now_saved && !tag.is_empty() {
                saved.set_tags(&found.name, tag);
            }
            saved
                .save(&cli.favorites)
                .await
                .with_context(|| format!("Failed to write '{}'", cli.favorites.display()))?;
            println!(
                "{} '{}'",
                if now_saved { "Saved" } else { "Removed" },
                found.name
            );
        }
        Command::Saved => {
            let saved = SavedRecipes::load(&cli.favorites)
                .await
                .with_context(|| format!("Failed to read '{}'", cli.favorites.display()))?;
            if cli.json {
                return print_json(&saved);
            }
            for entry in saved.iter() {
                println!(
                    "{} {}  [{}]",
                    entry.recipe.icon(),
                    entry.recipe.name(),
                    entry.user_tags.join(", ")
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let json = cli.json;
    match run(cli).await {
        Err(err) if json => {
            eprintln!("{}", serde_json::to_string_pretty(&error_report(&err))?);
            std::process::exit(1);
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisor_errors_keep_their_code_through_context() {
        let err = report(AdvisorError::RetriesExhausted {
            operation: "AI recipe generation".to_string(),
            attempts: 3,
            source: Box::new(AdvisorError::EmptyResponse("AI recipe generation".to_string())),
        });
        let report = error_report(&err);
        assert_eq!(report.code, "empty_response");
        assert_eq!(report.attempts, Some(3));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["code"], "empty_response");
        assert_eq!(value["attempts"], 3);
    }

    #[test]
    fn other_failures_are_classified() {
        let missing = anyhow::anyhow!("Recipe 'Pizza' is not in the catalog");
        let report = error_report(&missing);
        assert_eq!(report.code, "invalid_input");
        assert!(serde_json::to_value(&report).unwrap().get("attempts").is_none());

        let io = anyhow::Error::new(std::io::Error::other("disk full")).context("Failed to write");
        assert_eq!(error_report(&io).code, "storage");
    }
}
