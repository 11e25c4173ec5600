use crate::api_connection::connection::GenerationPrompt;
use crate::api_connection::endpoints::Schema;
use crate::context::{AiRequestContext, PlanPeriod};
use crate::models::CatalogRecipe;

pub const MIN_GENERATED_RECIPES: usize = 5;
pub const WEEKS_PER_MONTH: u32 = 4;

const RECIPE_SYSTEM_INSTRUCTION: &str = "You are a recipe creation and ingredient substitution expert \
who always puts the user's search intent and health conditions first.";

const MEAL_PLAN_SYSTEM_INSTRUCTION: &str = "You are a clinical dietitian who designs personalised meal plans \
around a user's health conditions and dietary restrictions.";

fn string_list() -> Schema {
    Schema::array_of(Schema::string())
}

pub fn modified_recipe_schema() -> Schema {
    Schema::array_of(Schema::object(
        [
            ("name", Schema::string()),
            ("modifiedIngredients", string_list()),
            ("modifiedDescription", Schema::string()),
            ("reason", Schema::string()),
        ],
        &["name", "modifiedIngredients", "reason"],
    ))
}

pub fn generated_recipes_schema() -> Schema {
    Schema::array_of(Schema::object(
        [
            ("name", Schema::string()),
            ("icon", Schema::string().describe("A single emoji for the main ingredient.")),
            ("modifiedIngredients", string_list().describe("Per-serving quantities with units.")),
            ("instructions", string_list()),
            ("modifiedDescription", Schema::string()),
            ("reason", Schema::string()),
            ("calories", Schema::integer()),
            ("protein", Schema::integer()),
            ("carbs", Schema::integer()),
            ("fat", Schema::integer()),
            ("fiber", Schema::number()),
            ("sugar", Schema::number()),
            ("sodium", Schema::integer()),
            ("potassium", Schema::integer()),
            ("cholesterol", Schema::integer()),
            ("calcium", Schema::integer()),
            ("iron", Schema::number()),
            ("magnesium", Schema::integer()),
            ("phosphorus", Schema::integer()),
        ],
        &[
            "name",
            "icon",
            "modifiedIngredients",
            "instructions",
            "reason",
            "calories",
            "protein",
            "carbs",
            "fat",
        ],
    ))
}

pub fn meal_plan_schema() -> Schema {
    let meal = Schema::object(
        [
            ("time", Schema::string()),
            ("menu", Schema::string()),
            ("note", Schema::string()),
        ],
        &["time", "menu", "note"],
    );
    let day = Schema::object(
        [
            ("day", Schema::string()),
            ("icon", Schema::string()),
            ("meals", Schema::array_of(meal)),
        ],
        &["day", "meals", "icon"],
    );
    Schema::object(
        [
            ("title", Schema::string()),
            ("reason", Schema::string()),
            ("plan", Schema::array_of(day)),
        ],
        &["title", "reason", "plan"],
    )
}

pub fn ingredient_modification_prompt(
    condition_label: &str,
    recipe: &CatalogRecipe,
    language: &str,
) -> GenerationPrompt {
    let user_prompt = format!(
        "You are a clinical nutritionist and health expert.
Your task is to modify a recipe for a user with a specific health condition: \"{condition}\".

Here is the original recipe:
- Name: {name}
- Ingredients: {ingredients}
- Description: {description}

Modify the ingredients to make the dish healthier and more suitable for someone with \"{condition}\".
For example, for kidney disease you should reduce sodium (salt, mayonnaise) and potassium (some vegetables).
Explain the nutritional and medical reasons for your changes in {language}.

Your response MUST be a valid JSON object in the specified format, enclosed in a single-element array.",
        condition = condition_label,
        name = recipe.name,
        ingredients = recipe.ingredients.join(", "),
        description = recipe.description,
        language = language,
    );

    GenerationPrompt {
        system_instruction: None,
        user_prompt,
        response_schema: modified_recipe_schema(),
    }
}

pub fn recipe_generation_prompt(context: &AiRequestContext, language: &str) -> GenerationPrompt {
    let query = context.query.as_deref().unwrap_or_default();
    let user_prompt = format!(
        "#### Request data

* 1. Health condition: {disease}
* 2. Allergies / foods to avoid: {avoidance}
* 3. Dish search query: {query}

#### Request

Create **at least {min} versions** of a recipe for the query \"{query}\".

Mandatory constraints:
1. Every recipe MUST be a dish related to \"{query}\".
2. The foods to avoid ({avoidance}) must not appear in any recipe in any form.
3. Every recipe's ingredients must be adapted to the health condition ({disease}).
4. Estimate each recipe's nutrition as precisely as possible, including micronutrients.
5. Every ingredient must state an exact per-serving measured quantity (g, ml, pieces, ...).
6. Choose an emoji icon matching each recipe's main ingredient.
7. Write names, descriptions, steps and reasons in {language}.

Your response MUST be a valid JSON array containing at least {min} recipe objects.",
        disease = context.disease,
        avoidance = context.avoidance,
        query = query,
        min = MIN_GENERATED_RECIPES,
        language = language,
    );

    GenerationPrompt {
        system_instruction: Some(RECIPE_SYSTEM_INSTRUCTION.to_string()),
        user_prompt,
        response_schema: generated_recipes_schema(),
    }
}

/// Period wording and the extra constraint line for a meal-plan request.
pub fn period_instructions(context: &AiRequestContext) -> (String, String) {
    match context.period.unwrap_or(PlanPeriod::Week) {
        PlanPeriod::Week => (
            "one week (7 days, breakfast, lunch and dinner each day)".to_string(),
            "Plan 7 days with exactly 3 meals per day: breakfast, lunch and dinner.".to_string(),
        ),
        PlanPeriod::Month => {
            let week = context.week_offset.max(1);
            (
                format!(
                    "week {} of a {}-week monthly plan (7 days)",
                    week, WEEKS_PER_MONTH
                ),
                format!(
                    "This request covers only **week {}** of the monthly plan: return exactly the 7 days of that week.",
                    week
                ),
            )
        }
        PlanPeriod::Lunchbox => {
            let mut extra = "**Office lunchbox plan**: leave out breakfast and dinner and recommend \
only a single 'lunch' menu per day for 7 days."
                .to_string();
            if context.is_meal_prep() {
                extra.push_str(
                    "\n**[Meal-prep mode]**: for busy workers, favour menus that can be cooked ahead \
on the weekend or the night before and simply packed in the morning.",
                );
            }
            ("one week of lunchboxes (one meal a day: lunch)".to_string(), extra)
        }
    }
}

pub fn meal_plan_prompt(context: &AiRequestContext, language: &str) -> GenerationPrompt {
    let (period_description, extra_instruction) = period_instructions(context);
    let user_prompt = format!(
        "#### Input data

The user asked for a meal plan.

* 1. Health condition: {disease}
* 2. Allergies / foods to avoid: {avoidance}
* 3. Requested period: {period}

#### Request

Create a detailed day-by-day, meal-by-meal plan that fits the health condition and period above and return it as JSON.

Mandatory constraints:
1. Foods to avoid must not appear anywhere in the plan.
2. The plan should keep nutrition balanced and support weight management over the period.
3. {extra}
4. Choose an emoji icon representing each day's meals.
5. Write titles, menus, notes and the reason in {language}.

Your response MUST be a valid JSON object in the specified format.",
        disease = context.disease,
        avoidance = context.avoidance,
        period = period_description,
        extra = extra_instruction,
        language = language,
    );

    GenerationPrompt {
        system_instruction: Some(MEAL_PLAN_SYSTEM_INSTRUCTION.to_string()),
        user_prompt,
        response_schema: meal_plan_schema(),
    }
}
