use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::context::{DiseaseSelection, PlanPeriod};

#[derive(Parser, Debug)]
#[command(author, version, about = "Health-aware recipe and meal-plan advisor", long_about = None)]
pub struct Cli {
    /// Selected condition as `key` or `key:Display name` (repeatable)
    #[arg(short, long = "condition", global = true, value_parser = parse_selection)]
    pub conditions: Vec<DiseaseSelection>,

    /// Comma-separated ingredients or allergens to avoid
    #[arg(short, long, global = true, default_value = "")]
    pub avoid: String,

    /// Where saved recipes are kept
    #[arg(long, global = true, default_value = "saved_recipes.json")]
    pub favorites: PathBuf,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the bundled catalog (by query, or by the selected conditions)
    Search {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Generate recipes for a dish with the AI service
    Recipes {
        #[arg(short, long)]
        query: String,
    },
    /// Ask the AI service to adapt a catalog recipe to the selected conditions
    Modify {
        /// Catalog recipe name
        #[arg(short, long)]
        recipe: String,
    },
    /// Generate a meal plan
    Plan {
        #[arg(short, long, value_enum, default_value_t = PeriodArg::Week)]
        period: PeriodArg,
        /// Favour dishes that can be cooked ahead (lunchbox only)
        #[arg(long)]
        meal_prep: bool,
        /// Number of weeks to load for a monthly plan (1-4)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=4))]
        weeks: u8,
    },
    /// Save a catalog recipe, or remove it if it is already saved
    Save {
        #[arg(short, long)]
        recipe: String,
        /// Tags to attach to the saved recipe
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// List saved recipes
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Week,
    Month,
    Lunchbox,
}

impl From<PeriodArg> for PlanPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Week => PlanPeriod::Week,
            PeriodArg::Month => PlanPeriod::Month,
            PeriodArg::Lunchbox => PlanPeriod::Lunchbox,
        }
    }
}

pub fn parse_selection(raw: &str) -> Result<DiseaseSelection, String> {
    let (key, name) = match raw.split_once(':') {
        Some((key, name)) => (key.trim(), name.trim()),
        None => (raw.trim(), raw.trim()),
    };
    if key.is_empty() {
        return Err("condition key must not be empty".to_string());
    }
    let name = if name.is_empty() { key } else { name };
    Ok(DiseaseSelection::new(key, name))
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
