use std::collections::HashSet;

use serde::Deserialize;

use crate::context::DiseaseSelection;
use crate::error::AdvisorError;
use crate::models::CatalogRecipe;

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Deserialize, Clone)]
struct CatalogSection {
    condition: String,
    recipes: Vec<CatalogRecipe>,
}

/// Read-only recipe collection grouped by condition key.
#[derive(Debug, Clone)]
pub struct RecipeCatalog {
    sections: Vec<CatalogSection>,
}

impl RecipeCatalog {
    pub fn bundled() -> Result<Self, AdvisorError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, AdvisorError> {
        let sections: Vec<CatalogSection> = serde_json::from_str(json)?;
        Ok(Self { sections })
    }

    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.condition.as_str())
    }

    fn all(&self) -> impl Iterator<Item = &CatalogRecipe> {
        self.sections.iter().flat_map(|s| s.recipes.iter())
    }

    pub fn by_condition(&self, key: &str) -> &[CatalogRecipe] {
        self.sections
            .iter()
            .find(|s| s.condition == key)
            .map(|s| s.recipes.as_slice())
            .unwrap_or(&[])
    }

    /// Recipes for every selected condition, first occurrence of each name wins.
    pub fn recipes_for(&self, selections: &[DiseaseSelection]) -> Vec<&CatalogRecipe> {
        let mut seen = HashSet::new();
        selections
            .iter()
            .flat_map(|s| self.by_condition(&s.key))
            .filter(|&r| seen.insert(r.name.as_str()))
            .collect()
    }

    /// Case-insensitive substring match over name, description and ingredients.
    pub fn search(&self, query: &str) -> Vec<&CatalogRecipe> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        self.all()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
                    || r.ingredients
                        .iter()
                        .any(|i| i.to_lowercase().contains(&needle))
            })
            .filter(|&r| seen.insert(r.name.as_str()))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&CatalogRecipe> {
        self.all().find(|r| r.name.eq_ignore_ascii_case(name.trim()))
    }
}
