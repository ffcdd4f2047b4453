use tracing::{debug, warn};

use crate::load::Load;
use crate::route::Route;
use crate::storage::RecipeStore;
use crate::storage::models::{Recipe, RecipeQuery};
use crate::views::notify::Alert;

pub const FEATURED_LIMIT: i64 = 6;
pub const NO_MATCHES: &str = "No recipes found matching your search.";

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Blank query; nothing happens.
    Ignored,
    Navigate(Route),
    NoMatches(Alert),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct LandingView {
    pub featured: Load<Vec<Recipe>>,
    pub query: String,
}

impl LandingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, store: &dyn RecipeStore) {
        self.featured.begin();
        self.featured
            .resolve(store.list_recipes(&RecipeQuery::sample(FEATURED_LIMIT)));
    }

    /// Checks that at least one title matches before sending the user to the list.
    pub fn submit_search(&self, store: &dyn RecipeStore) -> SearchOutcome {
        search(store, &self.query)
    }
}

pub fn search(store: &dyn RecipeStore, query: &str) -> SearchOutcome {
    if query.trim().is_empty() {
        return SearchOutcome::Ignored;
    }
    match store.recipe_ids_matching(query) {
        Ok(ids) if !ids.is_empty() => {
            debug!(query, matches = ids.len(), "search has matches");
            SearchOutcome::Navigate(Route::recipes_matching(query))
        }
        Ok(_) => SearchOutcome::NoMatches(Alert::new(NO_MATCHES)),
        Err(e) => {
            warn!(query, error = %e, "search existence check failed");
            SearchOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{Difficulty, Macros, NewRecipe};
    use crate::storage::sqlite::SqliteStore;
    use crate::views::filter::RecipeListView;

    fn store_with(titles: &[&str]) -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        for title in titles {
            store
                .insert_recipe(NewRecipe {
                    title: (*title).to_string(),
                    description: String::new(),
                    instructions: "Cook.".to_string(),
                    cooking_time: 15,
                    servings: 1,
                    difficulty: Difficulty::Medium,
                    image_url: None,
                    macros: Macros::default(),
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_featured_is_bounded() {
        let titles: Vec<String> = (0..9).map(|i| format!("Dish {i}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let store = store_with(&refs);
        let mut view = LandingView::new();
        view.load(&store);
        assert_eq!(view.featured.ready().unwrap().len(), FEATURED_LIMIT as usize);
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let store = store_with(&["Soup"]);
        let mut view = LandingView::new();
        view.query = "   ".to_string();
        assert_eq!(view.submit_search(&store), SearchOutcome::Ignored);
    }

    #[test]
    fn test_no_matches_alerts_without_navigation() {
        let store = store_with(&["Chicken Tacos", "Green Salad"]);
        let mut view = LandingView::new();
        view.query = "pasta".to_string();
        assert_eq!(
            view.submit_search(&store),
            SearchOutcome::NoMatches(Alert::new(NO_MATCHES))
        );
    }

    #[test]
    fn test_match_navigates_and_list_shows_all_matches() {
        let store = store_with(&["Chicken Tacos", "Roast CHICKEN", "Green Salad"]);
        let mut view = LandingView::new();
        view.query = "chicken".to_string();
        let outcome = view.submit_search(&store);
        assert_eq!(
            outcome,
            SearchOutcome::Navigate(Route::parse("/recipes?search=chicken").unwrap())
        );

        let SearchOutcome::Navigate(Route::Recipes { search }) = outcome else {
            panic!("expected navigation to the recipe list");
        };
        let mut list = RecipeListView::with_search(search.as_deref());
        list.refresh(&store);
        let mut titles: Vec<String> = list
            .recipes
            .ready()
            .unwrap()
            .iter()
            .map(|r| r.title.clone())
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["Chicken Tacos", "Roast CHICKEN"]);
    }
}
