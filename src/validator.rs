//! Turns raw model output into typed values or a precise error.
//!
//! Parsing happens in three steps: fence stripping, a plain JSON parse (failure is
//! [`AdvisorError::MalformedResponse`] with the raw text attached), then a typed decode
//! followed by [`Validate`] checks (failure is [`AdvisorError::SchemaViolation`]).
//! The service is asked for schema-conforming JSON, but nothing here assumes it complied.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::context::{PlanPeriod, DAYS_PER_WEEK};
use crate::error::AdvisorError;
use crate::models::{DailyPlan, GeneratedRecipe, Meal, MealPlan, Micronutrients, ModifiedRecipe};

pub const MAX_CALORIES: u32 = 5_000;
pub const MAX_MACRO_GRAMS: u32 = 1_000;

/// Deep checks applied after a successful decode.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, item)| item.validate().map_err(|e| format!("[{}] {}", i, e)))
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{}' must not be blank", field))
    } else {
        Ok(())
    }
}

fn require_items(field: &str, values: &[String]) -> Result<(), String> {
    if values.is_empty() {
        return Err(format!("'{}' must not be empty", field));
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(format!("'{}' contains a blank entry", field));
    }
    Ok(())
}

fn require_at_most(field: &str, value: u32, max: u32) -> Result<(), String> {
    if value > max {
        Err(format!("'{}' = {} exceeds {}", field, value, max))
    } else {
        Ok(())
    }
}

impl Validate for Micronutrients {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in self.present() {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("'{}' = {} is not a non-negative amount", name, value));
            }
        }
        Ok(())
    }
}

impl Validate for GeneratedRecipe {
    fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("icon", &self.icon)?;
        require_text("reason", &self.reason)?;
        require_items("modifiedIngredients", &self.modified_ingredients)?;
        require_items("instructions", &self.instructions)?;
        require_at_most("calories", self.calories, MAX_CALORIES)?;
        require_at_most("protein", self.protein, MAX_MACRO_GRAMS)?;
        require_at_most("carbs", self.carbs, MAX_MACRO_GRAMS)?;
        require_at_most("fat", self.fat, MAX_MACRO_GRAMS)?;
        self.micronutrients.validate()
    }
}

impl Validate for ModifiedRecipe {
    fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("reason", &self.reason)?;
        require_items("modifiedIngredients", &self.modified_ingredients)
    }
}

impl Validate for Meal {
    fn validate(&self) -> Result<(), String> {
        require_text("time", &self.time)?;
        require_text("menu", &self.menu)
    }
}

impl Validate for DailyPlan {
    fn validate(&self) -> Result<(), String> {
        require_text("day", &self.day)?;
        if self.meals.is_empty() {
            return Err(format!("day '{}' has no meals", self.day));
        }
        self.meals
            .validate()
            .map_err(|e| format!("day '{}' meals{}", self.day, e))
    }
}

impl Validate for MealPlan {
    fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title)?;
        self.plan.validate().map_err(|e| format!("plan{}", e))
    }
}

/// Checks that a decoded plan has the shape its period asks for.
///
/// Every period is answered one week at a time, so exactly seven days are expected.
/// Lunchbox plans carry a single meal per day.
pub fn check_plan_shape(plan: &MealPlan, period: Option<PlanPeriod>) -> Result<(), String> {
    if plan.plan.len() != DAYS_PER_WEEK {
        return Err(format!(
            "expected {} days, got {}",
            DAYS_PER_WEEK,
            plan.plan.len()
        ));
    }
    if period == Some(PlanPeriod::Lunchbox) {
        if let Some(day) = plan.plan.iter().find(|d| d.meals.len() != 1) {
            return Err(format!(
                "lunchbox day '{}' has {} meals, expected 1",
                day.day,
                day.meals.len()
            ));
        }
    }
    Ok(())
}

/// Removes a surrounding markdown code fence, if the model added one.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => inner[4..].trim(),
        _ => inner.trim(),
    }
}

/// Parses raw text as JSON, keeping the text on failure.
pub fn parse_json(raw: &str, operation: &str) -> Result<Value, AdvisorError> {
    let content = strip_code_fences(raw);
    serde_json::from_str(content).map_err(|e| {
        debug!(operation, error = %e, raw, "AI response is not valid JSON");
        AdvisorError::MalformedResponse {
            operation: operation.to_string(),
            raw: raw.to_string(),
        }
    })
}

pub fn parse_response<T>(raw: &str, operation: &str) -> Result<T, AdvisorError>
where
    T: DeserializeOwned + Validate,
{
    let value = parse_json(raw, operation)?;
    let parsed: T = serde_json::from_value(value).map_err(|e| AdvisorError::SchemaViolation {
        operation: operation.to_string(),
        reason: e.to_string(),
    })?;
    parsed
        .validate()
        .map_err(|reason| AdvisorError::SchemaViolation {
            operation: operation.to_string(),
            reason,
        })?;
    Ok(parsed)
}
