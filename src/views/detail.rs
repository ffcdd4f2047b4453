use tracing::warn;

use crate::load::Load;
use crate::storage::RecipeStore;
use crate::storage::models::{Ingredient, Recipe, RecipeId};

pub struct RecipeDetailView {
    pub id: RecipeId,
    pub recipe: Load<Recipe>,
    pub ingredients: Load<Vec<Ingredient>>,
}

impl RecipeDetailView {
    pub fn new(id: RecipeId) -> Self {
        Self {
            id,
            recipe: Load::NotRequested,
            ingredients: Load::NotRequested,
        }
    }

    pub fn begin(&mut self) {
        self.recipe.begin();
        self.ingredients.begin();
    }

    /// Fetches the recipe and its ingredients. The two reads resolve independently.
    pub fn load(&mut self, store: &dyn RecipeStore) {
        self.begin();

        let recipe = store.get_recipe(&self.id);
        if let Err(ref e) = recipe {
            warn!(id = %self.id, error = %e, "recipe fetch failed");
        }
        self.recipe.resolve(recipe);

        self.ingredients.resolve(store.ingredients_for(&self.id));
    }
}

/// Splits instruction text into display paragraphs on newline boundaries.
pub fn paragraphs(instructions: &str) -> Vec<&str> {
    instructions.split('\n').map(|p| p.trim_end_matches('\r')).collect()
}

pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CookbookError, Result};
    use crate::storage::models::{Difficulty, Macros, NewIngredient, NewRecipe, RecipeQuery};
    use crate::storage::sqlite::SqliteStore;

    fn store_with_recipe() -> (SqliteStore, RecipeId) {
        let store = SqliteStore::in_memory().unwrap();
        let recipe = store
            .insert_recipe(NewRecipe {
                title: "Pancakes".to_string(),
                description: "Fluffy".to_string(),
                instructions: "Mix.\nRest.\nFry.".to_string(),
                cooking_time: 25,
                servings: 4,
                difficulty: Difficulty::Easy,
                image_url: None,
                macros: Macros {
                    calories: 350.0,
                    protein: 9.0,
                    carbs: 55.0,
                    fat: 10.0,
                },
            })
            .unwrap();
        store
            .insert_ingredients(vec![NewIngredient {
                recipe_id: recipe.id.clone(),
                name: "Flour".to_string(),
                amount: 200.0,
                unit: "g".to_string(),
            }])
            .unwrap();
        (store, recipe.id)
    }

    /// Returns the recipe but fails every ingredient read.
    struct NoIngredients(SqliteStore);

    impl RecipeStore for NoIngredients {
        fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
            self.0.list_recipes(query)
        }
        fn recipe_ids_matching(&self, title: &str) -> Result<Vec<RecipeId>> {
            self.0.recipe_ids_matching(title)
        }
        fn get_recipe(&self, id: &str) -> Result<Recipe> {
            self.0.get_recipe(id)
        }
        fn ingredients_for(&self, _recipe_id: &str) -> Result<Vec<Ingredient>> {
            Err(CookbookError::Io("connection reset".to_string()))
        }
        fn insert_recipe(&self, recipe: NewRecipe) -> Result<Recipe> {
            self.0.insert_recipe(recipe)
        }
        fn insert_ingredients(&self, ingredients: Vec<NewIngredient>) -> Result<()> {
            self.0.insert_ingredients(ingredients)
        }
    }

    #[test]
    fn test_new_view_is_not_requested() {
        let view = RecipeDetailView::new("x".to_string());
        assert_eq!(view.recipe, Load::NotRequested);
        assert_eq!(view.ingredients, Load::NotRequested);
    }

    #[test]
    fn test_load_existing_recipe() {
        let (store, id) = store_with_recipe();
        let mut view = RecipeDetailView::new(id.clone());
        view.load(&store);
        let recipe = view.recipe.ready().unwrap();
        assert_eq!(recipe.id, id);
        assert_eq!(recipe.servings, 4);
        assert_eq!(view.ingredients.ready().unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_recipe_is_distinguishable() {
        let (store, _) = store_with_recipe();
        let mut view = RecipeDetailView::new("missing".to_string());
        view.load(&store);
        assert!(view.recipe.ready().is_none());
        assert!(!view.recipe.is_pending());
        assert!(view.recipe.error().unwrap().contains("not found"));
        assert_eq!(view.ingredients.ready().map(Vec::len), Some(0));
    }

    #[test]
    fn test_ingredient_failure_does_not_hide_recipe() {
        let (store, id) = store_with_recipe();
        let store = NoIngredients(store);
        let mut view = RecipeDetailView::new(id);
        view.load(&store);
        assert!(view.recipe.ready().is_some());
        assert!(view.ingredients.error().is_some());
    }

    #[test]
    fn test_reload_is_idempotent() {
        let (store, id) = store_with_recipe();
        let mut first = RecipeDetailView::new(id.clone());
        first.load(&store);
        let mut second = RecipeDetailView::new(id);
        second.load(&store);
        assert_eq!(first.recipe, second.recipe);
        assert_eq!(first.ingredients, second.ingredients);
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(paragraphs("Mix.\nRest.\r\nFry."), vec!["Mix.", "Rest.", "Fry."]);
        assert_eq!(paragraphs("One step"), vec!["One step"]);
        assert_eq!(paragraphs("a\n\nb"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(200.0), "200");
        assert_eq!(format_amount(0.5), "0.5");
    }
}
