pub mod models;
pub mod schema;
pub mod sqlite;

use crate::errors::Result;
use models::{Ingredient, NewIngredient, NewRecipe, Recipe, RecipeId, RecipeQuery};

/// Read/write access to the `recipes` and `ingredients` tables.
///
/// Views receive an implementation explicitly; nothing in the crate holds a
/// global client.
pub trait RecipeStore {
    fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>>;
    /// Identifier-only projection of recipes whose title contains `title`.
    fn recipe_ids_matching(&self, title: &str) -> Result<Vec<RecipeId>>;
    /// Fails with `NotFound` on zero rows and `Ambiguous` on more than one.
    fn get_recipe(&self, id: &str) -> Result<Recipe>;
    fn ingredients_for(&self, recipe_id: &str) -> Result<Vec<Ingredient>>;
    fn insert_recipe(&self, recipe: NewRecipe) -> Result<Recipe>;
    /// All-or-nothing batch; every row must reference an existing recipe.
    fn insert_ingredients(&self, ingredients: Vec<NewIngredient>) -> Result<()>;
}
