use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::AdvisorError;
use crate::models::RecipeView;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub recipe: RecipeView,
    #[serde(default)]
    pub user_tags: Vec<String>,
}

/// The user's saved recipes, keyed by recipe name.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SavedRecipes {
    recipes: Vec<SavedRecipe>,
}

impl SavedRecipes {
    /// Loads the list from `path`; a missing file is an empty list.
    pub async fn load(path: &Path) -> Result<Self, AdvisorError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no saved recipes yet");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), AdvisorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedRecipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn is_saved(&self, name: &str) -> bool {
        self.recipes.iter().any(|s| s.recipe.name() == name)
    }

    /// Saves the recipe, or removes it when already saved. Returns whether it is now saved.
    pub fn toggle(&mut self, recipe: RecipeView) -> bool {
        if self.is_saved(recipe.name()) {
            self.recipes.retain(|s| s.recipe.name() != recipe.name());
            false
        } else {
            self.recipes.push(SavedRecipe {
                recipe,
                user_tags: Vec::new(),
            });
            true
        }
    }

    /// Replaces the tags of a saved recipe. Returns false if it is not saved.
    pub fn set_tags(&mut self, name: &str, tags: Vec<String>) -> bool {
        match self.recipes.iter_mut().find(|s| s.recipe.name() == name) {
            Some(saved) => {
                saved.user_tags = tags;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RecipeCatalog;

    fn oats() -> RecipeView {
        let catalog = RecipeCatalog::bundled().unwrap();
        RecipeView::Catalog(catalog.find("Oat Greek Yogurt Bowl").unwrap().clone())
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut saved = SavedRecipes::default();
        assert!(saved.toggle(oats()));
        assert!(saved.is_saved("Oat Greek Yogurt Bowl"));
        assert!(!saved.toggle(oats()));
        assert!(saved.is_empty());
    }

    #[test]
    fn tags_only_apply_to_saved_recipes() {
        let mut saved = SavedRecipes::default();
        assert!(!saved.set_tags("Oat Greek Yogurt Bowl", vec!["breakfast".into()]));
        saved.toggle(oats());
        assert!(saved.set_tags("Oat Greek Yogurt Bowl", vec!["breakfast".into()]));
        assert_eq!(saved.iter().next().unwrap().user_tags, vec!["breakfast"]);
    }

    #[tokio::test]
    async fn persists_to_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("saved.json");

        let empty = SavedRecipes::load(&path).await.unwrap();
        assert!(empty.is_empty());

        let mut saved = SavedRecipes::default();
        saved.toggle(oats());
        saved.set_tags("Oat Greek Yogurt Bowl", vec!["quick".into()]);
        saved.save(&path).await.unwrap();

        let loaded = SavedRecipes::load(&path).await.unwrap();
        assert_eq!(loaded, saved);
    }
}
