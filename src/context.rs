use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used when the user has not selected any condition.
pub const DEFAULT_CONDITION_LABEL: &str = "general healthy eating";
/// Avoidance value used when the user entered nothing.
pub const NO_AVOIDANCE: &str = "none";
/// Separator between several selected condition names.
pub const CONDITION_SEPARATOR: &str = "/";
pub const DAYS_PER_WEEK: usize = 7;

/// One selected health condition: a catalog key and a human-readable name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DiseaseSelection {
    pub key: String,
    pub name: String,
}

impl DiseaseSelection {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }

    /// Condition refined by a sub-type, e.g. `kidney` + `pre-dialysis`.
    pub fn with_sub_option(id: &str, name: &str, sub_id: &str, sub_name: &str) -> Self {
        Self {
            key: format!("{}-{}", id, sub_id),
            name: format!("{} ({})", name, sub_name),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlanPeriod {
    Week,
    Month,
    Lunchbox,
}

impl fmt::Display for PlanPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanPeriod::Week => "week",
            PlanPeriod::Month => "month",
            PlanPeriod::Lunchbox => "lunchbox",
        };
        f.write_str(label)
    }
}

/// Everything an AI operation needs to know about the user's request.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiRequestContext {
    pub disease: String,
    pub avoidance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PlanPeriod>,
    pub week_offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_prep: Option<bool>,
}

impl AiRequestContext {
    pub fn is_meal_prep(&self) -> bool {
        self.meal_prep.unwrap_or(false)
    }
}

pub fn disease_label(selections: &[DiseaseSelection]) -> String {
    let names: Vec<&str> = selections
        .iter()
        .map(|s| s.name.trim())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        DEFAULT_CONDITION_LABEL.to_string()
    } else {
        names.join(CONDITION_SEPARATOR)
    }
}

pub fn avoidance_label(avoidance: &str) -> String {
    let trimmed = avoidance.trim();
    if trimmed.is_empty() {
        NO_AVOIDANCE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 1-based index of the week that follows `existing_days` already loaded days.
pub fn next_week_offset(existing_days: usize) -> u32 {
    (existing_days / DAYS_PER_WEEK) as u32 + 1
}

/// Maps user-selection state to an [`AiRequestContext`]. Building never fails.
#[derive(Debug, Clone)]
pub struct RequestContextBuilder<'a> {
    selections: &'a [DiseaseSelection],
    avoidance: &'a str,
    query: Option<String>,
    period: Option<PlanPeriod>,
    existing_days: usize,
    meal_prep: bool,
}

impl<'a> RequestContextBuilder<'a> {
    pub fn new(selections: &'a [DiseaseSelection], avoidance: &'a str) -> Self {
        Self {
            selections,
            avoidance,
            query: None,
            period: None,
            existing_days: 0,
            meal_prep: false,
        }
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn period(mut self, period: PlanPeriod) -> Self {
        self.period = Some(period);
        self
    }

    /// Number of plan days already loaded; drives the week offset.
    pub fn existing_days(mut self, days: usize) -> Self {
        self.existing_days = days;
        self
    }

    pub fn meal_prep(mut self, meal_prep: bool) -> Self {
        self.meal_prep = meal_prep;
        self
    }

    pub fn build(self) -> AiRequestContext {
        let meal_prep = match self.period {
            Some(PlanPeriod::Lunchbox) => Some(self.meal_prep),
            _ => None,
        };
        AiRequestContext {
            disease: disease_label(self.selections),
            avoidance: avoidance_label(self.avoidance),
            query: self.query,
            period: self.period,
            week_offset: next_week_offset(self.existing_days),
            meal_prep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_uses_default_label() {
        let ctx = RequestContextBuilder::new(&[], "").build();
        assert_eq!(ctx.disease, DEFAULT_CONDITION_LABEL);
        assert_eq!(ctx.avoidance, NO_AVOIDANCE);
        assert_eq!(ctx.week_offset, 1);
    }

    #[test]
    fn whitespace_avoidance_is_none() {
        assert_eq!(avoidance_label("   \t"), NO_AVOIDANCE);
        assert_eq!(avoidance_label(" peanuts, shrimp "), "peanuts, shrimp");
    }

    #[test]
    fn several_conditions_are_joined() {
        let selections = vec![
            DiseaseSelection::new("diabetes", "Diabetes"),
            DiseaseSelection::with_sub_option("kidney", "Kidney disease", "pre-dialysis", "pre-dialysis"),
        ];
        assert_eq!(selections[1].key, "kidney-pre-dialysis");
        assert_eq!(
            disease_label(&selections),
            "Diabetes/Kidney disease (pre-dialysis)"
        );
    }

    #[test]
    fn week_offset_follows_loaded_days() {
        assert_eq!(next_week_offset(0), 1);
        assert_eq!(next_week_offset(7), 2);
        assert_eq!(next_week_offset(13), 2);
        assert_eq!(next_week_offset(21), 4);
    }

    #[test]
    fn meal_prep_only_kept_for_lunchbox() {
        let week = RequestContextBuilder::new(&[], "")
            .period(PlanPeriod::Week)
            .meal_prep(true)
            .build();
        assert_eq!(week.meal_prep, None);

        let lunch = RequestContextBuilder::new(&[], "")
            .period(PlanPeriod::Lunchbox)
            .meal_prep(true)
            .build();
        assert!(lunch.is_meal_prep());
    }
}
