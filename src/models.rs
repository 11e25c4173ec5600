use serde::{de, Deserialize, Deserializer, Serialize};

/// Optional per-serving micronutrient estimates. Units: g for fiber/sugar, mg otherwise.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Micronutrients {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calcium: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iron: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnesium: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phosphorus: Option<f32>,
}

impl Micronutrients {
    /// `(name, value)` pairs for every populated field.
    pub fn present(&self) -> Vec<(&'static str, f32)> {
        [
            ("fiber", self.fiber),
            ("sugar", self.sugar),
            ("sodium", self.sodium),
            ("potassium", self.potassium),
            ("cholesterol", self.cholesterol),
            ("calcium", self.calcium),
            ("iron", self.iron),
            ("magnesium", self.magnesium),
            ("phosphorus", self.phosphorus),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Reads a count that may arrive as `320` or `320.0`.
fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!(
            "expected a whole non-negative number, got {}",
            value
        )));
    }
    Ok(value as u32)
}

/// A recipe synthesized by the generation service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub name: String,
    pub icon: String,
    pub modified_ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_description: Option<String>,
    pub reason: String,
    #[serde(deserialize_with = "whole_number")]
    pub calories: u32,
    #[serde(deserialize_with = "whole_number")]
    pub protein: u32,
    #[serde(deserialize_with = "whole_number")]
    pub carbs: u32,
    #[serde(deserialize_with = "whole_number")]
    pub fat: u32,
    #[serde(flatten)]
    pub micronutrients: Micronutrients,
}

/// A catalog recipe rewritten by the service for a specific condition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedRecipe {
    pub name: String,
    pub modified_ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_description: Option<String>,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Meal {
    pub time: String,
    pub menu: String,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DailyPlan {
    pub day: String,
    pub icon: String,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MealPlan {
    pub title: String,
    pub reason: String,
    pub plan: Vec<DailyPlan>,
}

/// A bundled, read-only recipe.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecipe {
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: String,
    pub ingredients: Vec<String>,
    pub calories: f32,
    pub protein: f32,
    pub carbs: f32,
    pub fat: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(flatten)]
    pub micronutrients: Micronutrients,
}

/// Anything the presentation layer can show as a recipe card.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecipeView {
    Catalog(CatalogRecipe),
    Generated(GeneratedRecipe),
}

impl RecipeView {
    pub fn name(&self) -> &str {
        match self {
            RecipeView::Catalog(r) => &r.name,
            RecipeView::Generated(r) => &r.name,
        }
    }

    pub fn icon(&self) -> &str {
        match self {
            RecipeView::Catalog(r) => &r.icon,
            RecipeView::Generated(r) => &r.icon,
        }
    }

    pub fn ingredients(&self) -> &[String] {
        match self {
            RecipeView::Catalog(r) => &r.ingredients,
            RecipeView::Generated(r) => &r.modified_ingredients,
        }
    }

    pub fn steps(&self) -> &[String] {
        match self {
            RecipeView::Catalog(r) => r.steps.as_deref().unwrap_or(&[]),
            RecipeView::Generated(r) => &r.instructions,
        }
    }

    pub fn calories(&self) -> f32 {
        match self {
            RecipeView::Catalog(r) => r.calories,
            RecipeView::Generated(r) => r.calories as f32,
        }
    }

    pub fn micronutrients(&self) -> &Micronutrients {
        match self {
            RecipeView::Catalog(r) => &r.micronutrients,
            RecipeView::Generated(r) => &r.micronutrients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_recipe_reads_flattened_micronutrients() {
        let json = r#"{
            "name": "Low-sodium bibimbap", "icon": "🍚",
            "modifiedIngredients": ["brown rice 150g"], "instructions": ["cook rice"],
            "reason": "less salt", "calories": 420, "protein": 18, "carbs": 60, "fat": 9,
            "sodium": 320, "iron": 2.5
        }"#;
        let recipe: GeneratedRecipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.micronutrients.sodium, Some(320.0));
        assert_eq!(recipe.micronutrients.iron, Some(2.5));
        assert_eq!(recipe.micronutrients.fiber, None);
        assert_eq!(recipe.micronutrients.present().len(), 2);
    }

    #[test]
    fn integral_floats_are_accepted_for_macros() {
        let json = r#"{
            "name": "Oat bowl", "icon": "🥣",
            "modifiedIngredients": ["oats 40g"], "instructions": ["soak oats"],
            "reason": "fiber", "calories": 320.0, "protein": 12, "carbs": 48.0, "fat": 7
        }"#;
        let recipe: GeneratedRecipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.calories, 320);
        assert_eq!(recipe.carbs, 48);

        let fractional = json.replace("320.0", "320.5");
        let err = serde_json::from_str::<GeneratedRecipe>(&fractional).unwrap_err();
        assert!(err.to_string().contains("whole non-negative number"), "{}", err);
    }

    #[test]
    fn recipe_view_is_tagged_by_kind() {
        let view = RecipeView::Generated(GeneratedRecipe {
            name: "Tofu bowl".into(),
            icon: "🥗".into(),
            modified_ingredients: vec!["tofu 100g".into()],
            instructions: vec!["slice tofu".into()],
            modified_description: None,
            reason: "plant protein".into(),
            calories: 300,
            protein: 20,
            carbs: 25,
            fat: 10,
            micronutrients: Micronutrients::default(),
        });
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["kind"], "generated");
        assert_eq!(view.steps(), ["slice tofu".to_string()]);

        let back: RecipeView = serde_json::from_value(value).unwrap();
        assert_eq!(back.name(), "Tofu bowl");
    }
}
