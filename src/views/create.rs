//! Recipe creation form.
//!
//! Submission writes the recipe row first and the ingredient batch second.
//! The two writes are not atomic: if the ingredient batch fails, the recipe
//! row stays behind with no ingredients and the caller is told so.

use std::str::FromStr;

use tracing::{info, warn};

use crate::errors::{CookbookError, Result};
use crate::route::Route;
use crate::storage::RecipeStore;
use crate::storage::models::{Difficulty, Macros, NewIngredient, NewRecipe, Recipe};
use crate::views::notify::Notification;

pub const RECIPE_FAILED: &str = "Failed to create recipe";
pub const INGREDIENTS_FAILED: &str = "Failed to add ingredients";
pub const CREATED: &str = "Recipe created successfully";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientDraft {
    pub name: String,
    pub amount: String,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientField {
    Name,
    Amount,
    Unit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDraft {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

impl Default for MacroDraft {
    fn default() -> Self {
        Self {
            calories: "0".to_string(),
            protein: "0".to_string(),
            carbs: "0".to_string(),
            fat: "0".to_string(),
        }
    }
}

/// Form contents exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub cooking_time: String,
    pub servings: String,
    pub difficulty: Option<Difficulty>,
    pub image_url: String,
    ingredients: Vec<IngredientDraft>,
    pub macros: MacroDraft,
}

impl Default for RecipeDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            instructions: String::new(),
            cooking_time: String::new(),
            servings: String::new(),
            difficulty: None,
            image_url: String::new(),
            ingredients: vec![IngredientDraft::default()],
            macros: MacroDraft::default(),
        }
    }
}

/// A draft that passed validation, with every number already coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub recipe: NewRecipe,
    /// `(name, amount, unit)` in form order.
    pub ingredients: Vec<(String, f64, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was written; the draft needs fixing first.
    Invalid(String),
    /// The recipe insert failed; nothing was written.
    RecipeFailed(Notification),
    /// The recipe exists but has no ingredients.
    IngredientsFailed {
        recipe: Recipe,
        notification: Notification,
    },
    Created {
        recipe: Recipe,
        notification: Notification,
        navigate: Route,
    },
}

impl SubmitOutcome {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            SubmitOutcome::Invalid(_) => None,
            SubmitOutcome::RecipeFailed(n) => Some(n),
            SubmitOutcome::IngredientsFailed { notification, .. }
            | SubmitOutcome::Created { notification, .. } => Some(notification),
        }
    }

    pub fn navigate(&self) -> Option<&Route> {
        match self {
            SubmitOutcome::Created { navigate, .. } => Some(navigate),
            _ => None,
        }
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CookbookError::InvalidInput(format!("{field} is required")))
    } else {
        Ok(trimmed)
    }
}

fn parse_number<T: FromStr>(value: &str, field: &str) -> Result<T> {
    required(value, field)?
        .parse()
        .map_err(|_| CookbookError::InvalidInput(format!("{field} must be a number")))
}

fn at_least_one(value: &str, field: &str) -> Result<i64> {
    let n: i64 = parse_number(value, field)?;
    if n < 1 {
        return Err(CookbookError::InvalidInput(format!("{field} must be at least 1")));
    }
    Ok(n)
}

fn non_negative(value: &str, field: &str) -> Result<f64> {
    let n: f64 = parse_number(value, field)?;
    if !n.is_finite() || n < 0.0 {
        return Err(CookbookError::InvalidInput(format!("{field} must be 0 or more")));
    }
    Ok(n)
}

impl RecipeDraft {
    pub fn ingredients(&self) -> &[IngredientDraft] {
        &self.ingredients
    }

    pub fn add_ingredient(&mut self) {
        self.ingredients.push(IngredientDraft::default());
    }

    /// Removes the row at `index`. The last remaining row cannot be removed.
    pub fn remove_ingredient(&mut self, index: usize) -> bool {
        if self.ingredients.len() <= 1 || index >= self.ingredients.len() {
            return false;
        }
        self.ingredients.remove(index);
        true
    }

    pub fn update_ingredient(&mut self, index: usize, field: IngredientField, value: &str) -> bool {
        match self.ingredient_field_mut(index, field) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn ingredient_field_mut(
        &mut self,
        index: usize,
        field: IngredientField,
    ) -> Option<&mut String> {
        let row = self.ingredients.get_mut(index)?;
        Some(match field {
            IngredientField::Name => &mut row.name,
            IngredientField::Amount => &mut row.amount,
            IngredientField::Unit => &mut row.unit,
        })
    }

    pub fn validate(&self) -> Result<ValidDraft> {
        let title = required(&self.title, "Title")?;
        let description = required(&self.description, "Description")?;
        let cooking_time = at_least_one(&self.cooking_time, "Cooking time")?;
        let servings = at_least_one(&self.servings, "Servings")?;
        let difficulty = self
            .difficulty
            .ok_or_else(|| CookbookError::InvalidInput("Difficulty is required".to_string()))?;
        let macros = Macros {
            calories: non_negative(&self.macros.calories, "Calories")?,
            protein: non_negative(&self.macros.protein, "Protein")?,
            carbs: non_negative(&self.macros.carbs, "Carbs")?,
            fat: non_negative(&self.macros.fat, "Fat")?,
        };
        let instructions = required(&self.instructions, "Instructions")?;

        if self.ingredients.is_empty() {
            return Err(CookbookError::InvalidInput(
                "At least one ingredient is required".to_string(),
            ));
        }
        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for (i, row) in self.ingredients.iter().enumerate() {
            let n = i + 1;
            let name = required(&row.name, &format!("Ingredient {n} name"))?;
            let amount = non_negative(&row.amount, &format!("Ingredient {n} amount"))?;
            let unit = required(&row.unit, &format!("Ingredient {n} unit"))?;
            ingredients.push((name.to_string(), amount, unit.to_string()));
        }

        let image_url = self.image_url.trim();
        Ok(ValidDraft {
            recipe: NewRecipe {
                title: title.to_string(),
                description: description.to_string(),
                instructions: instructions.to_string(),
                cooking_time,
                servings,
                difficulty,
                image_url: if image_url.is_empty() {
                    None
                } else {
                    Some(image_url.to_string())
                },
                macros,
            },
            ingredients,
        })
    }

    /// Validates, then writes the recipe and its ingredients in that order.
    ///
    /// The draft is left untouched whatever the outcome, so the user can retry.
    pub fn submit(&self, store: &dyn RecipeStore) -> SubmitOutcome {
        let valid = match self.validate() {
            Ok(v) => v,
            Err(e) => return SubmitOutcome::Invalid(e.to_string()),
        };

        let recipe = match store.insert_recipe(valid.recipe) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "recipe insert failed");
                return SubmitOutcome::RecipeFailed(Notification::error(RECIPE_FAILED));
            }
        };

        let rows = valid
            .ingredients
            .into_iter()
            .map(|(name, amount, unit)| NewIngredient {
                recipe_id: recipe.id.clone(),
                name,
                amount,
                unit,
            })
            .collect();

        if let Err(e) = store.insert_ingredients(rows) {
            warn!(id = %recipe.id, error = %e, "ingredient insert failed; recipe left without ingredients");
            return SubmitOutcome::IngredientsFailed {
                recipe,
                notification: Notification::error(INGREDIENTS_FAILED),
            };
        }

        info!(id = %recipe.id, "recipe created");
        let navigate = Route::Recipe(recipe.id.clone());
        SubmitOutcome::Created {
            recipe,
            notification: Notification::success(CREATED),
            navigate,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::storage::models::{Ingredient, RecipeId, RecipeQuery};
    use crate::storage::sqlite::SqliteStore;

    fn filled_draft(ingredient_count: usize) -> RecipeDraft {
        let mut draft = RecipeDraft {
            title: "Chicken Stir Fry".to_string(),
            description: "Quick weeknight dinner".to_string(),
            instructions: "Slice.\nFry.\nServe.".to_string(),
            cooking_time: "20".to_string(),
            servings: "2".to_string(),
            difficulty: Some(Difficulty::Easy),
            image_url: String::new(),
            macros: MacroDraft {
                calories: "520".to_string(),
                protein: "38.5".to_string(),
                carbs: "45".to_string(),
                fat: "14".to_string(),
            },
            ..Default::default()
        };
        for i in 0..ingredient_count {
            if i > 0 {
                draft.add_ingredient();
            }
            draft.update_ingredient(i, IngredientField::Name, &format!("Item {i}"));
            draft.update_ingredient(i, IngredientField::Amount, "1.5");
            draft.update_ingredient(i, IngredientField::Unit, "cups");
        }
        draft
    }

    /// Wraps a real store and fails the chosen write.
    struct FlakyStore {
        inner: SqliteStore,
        fail_recipe: bool,
        fail_ingredients: bool,
        ingredient_calls: Cell<usize>,
    }

    impl FlakyStore {
        fn new(fail_recipe: bool, fail_ingredients: bool) -> Self {
            Self {
                inner: SqliteStore::in_memory().unwrap(),
                fail_recipe,
                fail_ingredients,
                ingredient_calls: Cell::new(0),
            }
        }
    }

    impl RecipeStore for FlakyStore {
        fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
            self.inner.list_recipes(query)
        }
        fn recipe_ids_matching(&self, title: &str) -> Result<Vec<RecipeId>> {
            self.inner.recipe_ids_matching(title)
        }
        fn get_recipe(&self, id: &str) -> Result<Recipe> {
            self.inner.get_recipe(id)
        }
        fn ingredients_for(&self, recipe_id: &str) -> Result<Vec<Ingredient>> {
            self.inner.ingredients_for(recipe_id)
        }
        fn insert_recipe(&self, recipe: NewRecipe) -> Result<Recipe> {
            if self.fail_recipe {
                return Err(CookbookError::Io("network unreachable".to_string()));
            }
            self.inner.insert_recipe(recipe)
        }
        fn insert_ingredients(&self, ingredients: Vec<NewIngredient>) -> Result<()> {
            self.ingredient_calls.set(self.ingredient_calls.get() + 1);
            if self.fail_ingredients {
                return Err(CookbookError::Io("network unreachable".to_string()));
            }
            self.inner.insert_ingredients(ingredients)
        }
    }

    // --- Ingredient rows ---

    #[test]
    fn test_default_draft_has_one_row() {
        let draft = RecipeDraft::default();
        assert_eq!(draft.ingredients().len(), 1);
        assert_eq!(draft.macros.calories, "0");
    }

    #[test]
    fn test_cannot_remove_last_row() {
        let mut draft = RecipeDraft::default();
        assert!(!draft.remove_ingredient(0));
        assert_eq!(draft.ingredients().len(), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut draft = filled_draft(3);
        assert!(draft.remove_ingredient(1));
        let names: Vec<&str> = draft.ingredients().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Item 0", "Item 2"]);
        assert!(!draft.remove_ingredient(5));
    }

    #[test]
    fn test_update_out_of_range() {
        let mut draft = RecipeDraft::default();
        assert!(!draft.update_ingredient(3, IngredientField::Name, "Salt"));
        assert!(draft.ingredient_field_mut(3, IngredientField::Unit).is_none());
    }

    // --- Validation ---

    #[test]
    fn test_validate_coerces_numbers() {
        let valid = filled_draft(2).validate().unwrap();
        assert_eq!(valid.recipe.cooking_time, 20);
        assert_eq!(valid.recipe.servings, 2);
        assert_eq!(valid.recipe.macros.protein, 38.5);
        assert_eq!(valid.recipe.image_url, None);
        assert_eq!(valid.ingredients[1], ("Item 1".to_string(), 1.5, "cups".to_string()));
    }

    #[test]
    fn test_validate_requires_fields() {
        let mut draft = filled_draft(1);
        draft.title = "   ".to_string();
        assert!(matches!(draft.validate(), Err(CookbookError::InvalidInput(m)) if m.contains("Title")));

        let mut draft = filled_draft(1);
        draft.difficulty = None;
        assert!(draft.validate().is_err());

        let mut draft = filled_draft(2);
        draft.update_ingredient(1, IngredientField::Unit, "");
        assert!(matches!(draft.validate(), Err(CookbookError::InvalidInput(m)) if m.contains("Ingredient 2 unit")));
    }

    #[test]
    fn test_validate_numeric_bounds() {
        let mut draft = filled_draft(1);
        draft.servings = "0".to_string();
        assert!(draft.validate().is_err());

        let mut draft = filled_draft(1);
        draft.cooking_time = "ten".to_string();
        assert!(draft.validate().is_err());

        let mut draft = filled_draft(1);
        draft.macros.fat = "-1".to_string();
        assert!(draft.validate().is_err());

        let mut draft = filled_draft(1);
        draft.update_ingredient(0, IngredientField::Amount, "0");
        assert!(draft.validate().is_ok());
    }

    // --- Submit ---

    #[test]
    fn test_submit_creates_recipe_and_all_ingredients() {
        let store = SqliteStore::in_memory().unwrap();
        let draft = filled_draft(3);
        let outcome = draft.submit(&store);

        let SubmitOutcome::Created { recipe, notification, navigate } = outcome else {
            panic!("expected Created outcome");
        };
        assert_eq!(notification, Notification::success(CREATED));
        assert_eq!(navigate, Route::Recipe(recipe.id.clone()));
        assert_eq!(store.list_recipes(&RecipeQuery::default()).unwrap().len(), 1);
        let ingredients = store.ingredients_for(&recipe.id).unwrap();
        assert_eq!(ingredients.len(), 3);
        assert!(ingredients.iter().all(|i| i.recipe_id == recipe.id));
    }

    #[test]
    fn test_submit_invalid_writes_nothing() {
        let store = FlakyStore::new(false, false);
        let mut draft = filled_draft(1);
        draft.instructions.clear();
        let outcome = draft.submit(&store);
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert!(outcome.notification().is_none());
        assert!(store.list_recipes(&RecipeQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_submit_recipe_failure_aborts() {
        let store = FlakyStore::new(true, false);
        let draft = filled_draft(2);
        let outcome = draft.submit(&store);
        assert_eq!(outcome, SubmitOutcome::RecipeFailed(Notification::error(RECIPE_FAILED)));
        assert!(outcome.notification().unwrap().is_destructive());
        assert!(outcome.navigate().is_none());
        assert_eq!(store.ingredient_calls.get(), 0);
        assert_eq!(draft, filled_draft(2));
    }

    #[test]
    fn test_submit_ingredient_failure_leaves_recipe() {
        let store = FlakyStore::new(false, true);
        let outcome = filled_draft(2).submit(&store);
        let SubmitOutcome::IngredientsFailed { recipe, notification } = outcome else {
            panic!("expected IngredientsFailed outcome");
        };
        assert_eq!(notification, Notification::error(INGREDIENTS_FAILED));
        let fetched = store.get_recipe(&recipe.id).unwrap();
        assert_eq!(fetched.title, "Chicken Stir Fry");
        assert!(store.ingredients_for(&recipe.id).unwrap().is_empty());
    }
}
