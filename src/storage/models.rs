use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type RecipeId = String;

pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1546069901-ba9599a7e63c";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Difficulty> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-serving nutrition values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub cooking_time: i64,
    pub servings: i64,
    pub difficulty: Difficulty,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub macros: Macros,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn image_or_placeholder(&self) -> &str {
        match self.image_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => PLACEHOLDER_IMAGE_URL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub cooking_time: i64,
    pub servings: i64,
    pub difficulty: Difficulty,
    pub image_url: Option<String>,
    pub macros: Macros,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub id: String,
    pub recipe_id: RecipeId,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIngredient {
    pub recipe_id: RecipeId,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Inclusive numeric bound applied to a macro column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Between {
    pub lo: f64,
    pub hi: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeQuery {
    pub title_contains: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<Between>,
    pub protein: Option<Between>,
    pub limit: Option<i64>,
}

impl RecipeQuery {
    pub fn sample(limit: i64) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Same predicate the store applies, evaluated in memory.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let title_ok = match self.title_contains.as_deref() {
            Some(q) if !q.is_empty() => recipe.title.to_lowercase().contains(&q.to_lowercase()),
            _ => true,
        };
        let difficulty_ok = self.difficulty.is_none_or(|d| d == recipe.difficulty);
        let calories_ok = self
            .calories
            .is_none_or(|b| recipe.macros.calories >= b.lo && recipe.macros.calories <= b.hi);
        let protein_ok = self
            .protein
            .is_none_or(|b| recipe.macros.protein >= b.lo && recipe.macros.protein <= b.hi);
        title_ok && difficulty_ok && calories_ok && protein_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(title: &str, difficulty: Difficulty, calories: f64, protein: f64) -> Recipe {
        Recipe {
            id: "r1".to_string(),
            title: title.to_string(),
            description: String::new(),
            instructions: String::new(),
            cooking_time: 10,
            servings: 2,
            difficulty,
            image_url: None,
            macros: Macros {
                calories,
                protein,
                carbs: 0.0,
                fat: 0.0,
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse(" Hard "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("all"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn test_image_placeholder() {
        let mut r = recipe("Soup", Difficulty::Easy, 100.0, 5.0);
        assert_eq!(r.image_or_placeholder(), PLACEHOLDER_IMAGE_URL);
        r.image_url = Some(String::new());
        assert_eq!(r.image_or_placeholder(), PLACEHOLDER_IMAGE_URL);
        r.image_url = Some("https://example.com/soup.jpg".to_string());
        assert_eq!(r.image_or_placeholder(), "https://example.com/soup.jpg");
    }

    #[test]
    fn test_query_matches_is_conjunctive() {
        let q = RecipeQuery {
            title_contains: Some("taco".to_string()),
            difficulty: Some(Difficulty::Easy),
            calories: Some(Between { lo: 200.0, hi: 600.0 }),
            ..Default::default()
        };
        assert!(q.matches(&recipe("Fish Tacos", Difficulty::Easy, 450.0, 30.0)));
        assert!(!q.matches(&recipe("Fish Tacos", Difficulty::Hard, 450.0, 30.0)));
        assert!(!q.matches(&recipe("Fish Tacos", Difficulty::Easy, 700.0, 30.0)));
        assert!(!q.matches(&recipe("Burrito", Difficulty::Easy, 450.0, 30.0)));
    }

    #[test]
    fn test_serialize_flattens_macros() {
        let value = serde_json::to_value(recipe("Soup", Difficulty::Medium, 120.0, 8.0)).unwrap();
        assert_eq!(value["difficulty"], "medium");
        assert_eq!(value["calories"], 120.0);
        assert_eq!(value["protein"], 8.0);
    }
}
