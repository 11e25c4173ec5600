use tracing::{debug, info};

use crate::ai_client::AiClient;
use crate::context::{DiseaseSelection, PlanPeriod, RequestContextBuilder};
use crate::error::AdvisorError;
use crate::models::MealPlan;

/// Longest plan a monthly request grows to: four weeks.
pub const MONTH_DAY_CAP: usize = 28;

/// A meal plan being built up, possibly over several requests.
#[derive(Debug, Clone, Default)]
pub struct MealPlanner {
    plan: Option<MealPlan>,
    period: Option<PlanPeriod>,
    meal_prep: bool,
    selections: Vec<DiseaseSelection>,
    avoidance: String,
}

/// Appends `next`'s days to `existing`, keeping `existing`'s title and reason.
pub fn merge(mut existing: MealPlan, next: MealPlan, cap: usize) -> MealPlan {
    existing.plan.extend(next.plan);
    existing.plan.truncate(cap);
    existing
}

impl MealPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self) -> Option<&MealPlan> {
        self.plan.as_ref()
    }

    pub fn period(&self) -> Option<PlanPeriod> {
        self.period
    }

    pub fn day_count(&self) -> usize {
        self.plan.as_ref().map_or(0, |p| p.plan.len())
    }

    /// More weeks can be requested only for monthly plans shorter than four weeks.
    pub fn can_load_more(&self) -> bool {
        self.period == Some(PlanPeriod::Month) && self.day_count() < MONTH_DAY_CAP
    }

    /// Starts a new plan, replacing any previous one. The old plan is kept on failure.
    pub async fn generate(
        &mut self,
        client: &AiClient,
        selections: &[DiseaseSelection],
        avoidance: &str,
        period: PlanPeriod,
        meal_prep: bool,
    ) -> Result<&MealPlan, AdvisorError> {
        let context = RequestContextBuilder::new(selections, avoidance)
            .period(period)
            .meal_prep(meal_prep)
            .build();
        let mut plan = client.generate_meal_plan(&context).await?;
        if period == PlanPeriod::Month {
            plan.plan.truncate(MONTH_DAY_CAP);
        }

        self.period = Some(period);
        self.meal_prep = meal_prep;
        self.selections = selections.to_vec();
        self.avoidance = avoidance.to_string();
        Ok(&*self.plan.insert(plan))
    }

    /// Requests the week after the loaded days and appends it; returns the number of days added.
    pub async fn load_next_week(&mut self, client: &AiClient) -> Result<usize, AdvisorError> {
        let (Some(period), Some(current)) = (self.period, self.plan.as_ref()) else {
            return Err(AdvisorError::NoActivePlan);
        };
        if !self.can_load_more() {
            debug!(days = current.plan.len(), "meal plan already complete");
            return Ok(0);
        }

        let before = current.plan.len();
        let context = RequestContextBuilder::new(&self.selections, &self.avoidance)
            .period(period)
            .meal_prep(self.meal_prep)
            .existing_days(before)
            .build();
        let week = context.week_offset;
        let next = client.generate_meal_plan(&context).await?;

        if let Some(current) = self.plan.take() {
            self.plan = Some(merge(current, next, MONTH_DAY_CAP));
        }
        let added = self.day_count() - before;
        info!(week, added, total = self.day_count(), "appended meal plan week");
        Ok(added)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
