use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::api_connection::connection::{GeminiProvider, GenerationPrompt, TextGenerator};
use crate::config::AdvisorConfig;
use crate::context::AiRequestContext;
use crate::error::AdvisorError;
use crate::models::{CatalogRecipe, GeneratedRecipe, MealPlan, ModifiedRecipe};
use crate::prompts;
use crate::validator::{check_plan_shape, parse_response};

pub const MODIFY_OPERATION: &str = "ingredient modification";
pub const RECIPES_OPERATION: &str = "AI recipe generation";
pub const MEAL_PLAN_OPERATION: &str = "AI meal plan generation";

/// Builds the generator once a credential is known.
pub type GeneratorFactory =
    Box<dyn Fn(&AdvisorConfig, &str) -> Arc<dyn TextGenerator> + Send + Sync>;

/// Entry point for every AI-backed operation.
///
/// The generator handle is created on first use and then shared for the lifetime of
/// the client. Construct one client at startup and pass it by reference.
pub struct AiClient {
    config: AdvisorConfig,
    factory: GeneratorFactory,
    generator: OnceCell<Arc<dyn TextGenerator>>,
}

impl AiClient {
    /// Client backed by the Gemini REST API.
    pub fn new(config: AdvisorConfig) -> Self {
        Self::with_factory(
            config,
            Box::new(|config: &AdvisorConfig, api_key: &str| -> Arc<dyn TextGenerator> {
                Arc::new(
                    GeminiProvider::new(api_key, config.model.clone(), config.api_url.clone())
                        .with_temperature(config.temperature)
                        .with_max_output_tokens(config.max_output_tokens),
                )
            }),
        )
    }

    pub fn with_factory(config: AdvisorConfig, factory: GeneratorFactory) -> Self {
        Self {
            config,
            factory,
            generator: OnceCell::new(),
        }
    }

    /// Client around an already-built generator; no credential check is made.
    pub fn with_generator(config: AdvisorConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let shared = Arc::clone(&generator);
        Self {
            config,
            factory: Box::new(move |_: &AdvisorConfig, _: &str| Arc::clone(&shared)),
            generator: OnceCell::new_with(Some(generator)),
        }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.generator.initialized()
    }

    async fn generator(&self) -> Result<Arc<dyn TextGenerator>, AdvisorError> {
        self.generator
            .get_or_try_init(|| async {
                let api_key = self.config.credential()?;
                info!(model = %self.config.model, "initialising generation client");
                Ok::<_, AdvisorError>((self.factory)(&self.config, api_key))
            })
            .await
            .map(Arc::clone)
    }

    async fn complete(&self, prompt: &GenerationPrompt) -> Result<String, AdvisorError> {
        let generator = self.generator().await?;
        let raw = generator.generate(prompt).await?;
        debug!(bytes = raw.len(), "received AI response");
        Ok(raw)
    }

    /// Adapts a catalog recipe's ingredients to `condition_label`.
    pub async fn modify_ingredients(
        &self,
        condition_label: &str,
        recipe: &CatalogRecipe,
    ) -> Result<ModifiedRecipe, AdvisorError> {
        let prompt = &prompts::ingredient_modification_prompt(
            condition_label,
            recipe,
            &self.config.response_language,
        );
        self.config
            .retry
            .run(MODIFY_OPERATION, move || async move {
                let raw = self.complete(prompt).await?;
                let mut modified: Vec<ModifiedRecipe> = parse_response(&raw, MODIFY_OPERATION)?;
                if modified.is_empty() {
                    return Err(AdvisorError::EmptyResponse(MODIFY_OPERATION.to_string()));
                }
                Ok(modified.swap_remove(0))
            })
            .await
    }

    /// Generates recipe variants for the context's search query.
    pub async fn generate_recipes(
        &self,
        context: &AiRequestContext,
    ) -> Result<Vec<GeneratedRecipe>, AdvisorError> {
        if context.query.as_deref().map_or(true, |q| q.trim().is_empty()) {
            return Err(AdvisorError::MissingQuery);
        }
        let prompt = &prompts::recipe_generation_prompt(context, &self.config.response_language);
        let recipes = self
            .config
            .retry
            .run(RECIPES_OPERATION, move || async move {
                let raw = self.complete(prompt).await?;
                let recipes: Vec<GeneratedRecipe> = parse_response(&raw, RECIPES_OPERATION)?;
                if recipes.is_empty() {
                    return Err(AdvisorError::EmptyResponse(RECIPES_OPERATION.to_string()));
                }
                Ok(recipes)
            })
            .await?;
        info!(count = recipes.len(), query = ?context.query, "generated recipes");
        Ok(recipes)
    }

    /// Generates one chunk of a meal plan for the context's period and week offset.
    pub async fn generate_meal_plan(
        &self,
        context: &AiRequestContext,
    ) -> Result<MealPlan, AdvisorError> {
        let prompt = &prompts::meal_plan_prompt(context, &self.config.response_language);
        let plan = self
            .config
            .retry
            .run(MEAL_PLAN_OPERATION, move || async move {
                let raw = self.complete(prompt).await?;
                let plan: MealPlan = parse_response(&raw, MEAL_PLAN_OPERATION)?;
                check_plan_shape(&plan, context.period).map_err(|reason| {
                    AdvisorError::SchemaViolation {
                        operation: MEAL_PLAN_OPERATION.to_string(),
                        reason,
                    }
                })?;
                Ok(plan)
            })
            .await?;
        info!(
            days = plan.plan.len(),
            period = ?context.period,
            week = context.week_offset,
            "generated meal plan"
        );
        Ok(plan)
    }
}
