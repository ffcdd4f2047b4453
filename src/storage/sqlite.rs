use std::fs;
use std::path::Path;

use chrono::Utc;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use super::RecipeStore;
use super::models::{
    Difficulty, Ingredient, Macros, NewIngredient, NewRecipe, Recipe, RecipeId, RecipeQuery,
};
use super::schema;
use crate::errors::{CookbookError, Result};

/// SQL function folding text with Unicode case rules; built-in `lower()` and
/// `LIKE` only fold ASCII.
const UNICODE_LOWER: &str = "unicode_lower";

const RECIPE_COLUMNS: &str = "
    id, title, description, instructions, cooking_time, servings, difficulty,
    image_url, calories, protein, carbs, fat, created_at
";

pub struct SqliteStore {
    conn: Connection,
}

fn row_to_recipe(row: &Row) -> rusqlite::Result<Recipe> {
    let difficulty_str: String = row.get(6)?;
    let difficulty = Difficulty::parse(&difficulty_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("unknown difficulty {difficulty_str:?}").into(),
        )
    })?;
    Ok(Recipe {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        instructions: row.get(3)?,
        cooking_time: row.get(4)?,
        servings: row.get(5)?,
        difficulty,
        image_url: row.get(7)?,
        macros: Macros {
            calories: row.get(8)?,
            protein: row.get(9)?,
            carbs: row.get(10)?,
            fat: row.get(11)?,
        },
        created_at: row.get(12)?,
    })
}

fn row_to_ingredient(row: &Row) -> rusqlite::Result<Ingredient> {
    Ok(Ingredient {
        id: row.get(0)?,
        recipe_id: row.get(1)?,
        name: row.get(2)?,
        amount: row.get(3)?,
        unit: row.get(4)?,
    })
}

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// `WHERE` fragment for a case-insensitive title substring match; bind with [`title_pattern`].
fn title_condition() -> String {
    format!("{UNICODE_LOWER}(title) LIKE ? ESCAPE '\\'")
}

fn title_pattern(text: &str) -> String {
    contains_pattern(&text.to_lowercase())
}

/// Builds a `LIKE` pattern matching `text` anywhere, with wildcards in `text` taken literally.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(&conn)?;
        conn.execute(schema::CREATE_RECIPES_TABLE, [])?;
        conn.execute(schema::CREATE_INGREDIENTS_TABLE, [])?;
        conn.execute(schema::CREATE_INDEX_TITLE, [])?;
        conn.execute(schema::CREATE_INDEX_DIFFICULTY, [])?;
        conn.execute(schema::CREATE_INDEX_RECIPE_ID, [])?;
        Ok(Self { conn })
    }

    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::new(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::new(conn)
    }

    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl RecipeStore for SqliteStore {
    fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref title) = query.title_contains
            && !title.is_empty()
        {
            conditions.push(title_condition());
            param_values.push(Box::new(title_pattern(title)));
        }
        if let Some(difficulty) = query.difficulty {
            conditions.push("difficulty = ?".to_string());
            param_values.push(Box::new(difficulty.as_str()));
        }
        if let Some(range) = query.calories {
            conditions.push("calories >= ? AND calories <= ?".to_string());
            param_values.push(Box::new(range.lo));
            param_values.push(Box::new(range.hi));
        }
        if let Some(range) = query.protein {
            conditions.push("protein >= ? AND protein <= ?".to_string());
            param_values.push(Box::new(range.lo));
            param_values.push(Box::new(range.hi));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // SQLite treats a negative LIMIT as "no limit".
        param_values.push(Box::new(query.limit.unwrap_or(-1)));

        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT ?"
        );
        debug!(%sql, "listing recipes");

        let param_refs: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let recipes = stmt
            .query_map(param_refs.as_slice(), row_to_recipe)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    fn recipe_ids_matching(&self, title: &str) -> Result<Vec<RecipeId>> {
        let sql = format!("SELECT id FROM recipes WHERE {}", title_condition());
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![title_pattern(title)], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn get_recipe(&self, id: &str) -> Result<Recipe> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ? LIMIT 2");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt
            .query_map(params![id], row_to_recipe)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        match rows.len() {
            0 => Err(CookbookError::NotFound(format!("Recipe with id {id} not found"))),
            1 => Ok(rows.remove(0)),
            _ => Err(CookbookError::Ambiguous(format!(
                "More than one recipe with id {id}"
            ))),
        }
    }

    fn ingredients_for(&self, recipe_id: &str) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, name, amount, unit FROM ingredients
             WHERE recipe_id = ? ORDER BY rowid",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], row_to_ingredient)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    fn insert_recipe(&self, recipe: NewRecipe) -> Result<Recipe> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO recipes (id, title, description, instructions, cooking_time, servings,
                                  difficulty, image_url, calories, protein, carbs, fat, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                recipe.title,
                recipe.description,
                recipe.instructions,
                recipe.cooking_time,
                recipe.servings,
                recipe.difficulty.as_str(),
                recipe.image_url,
                recipe.macros.calories,
                recipe.macros.protein,
                recipe.macros.carbs,
                recipe.macros.fat,
                now,
            ],
        )?;
        info!(%id, title = %recipe.title, "inserted recipe");
        self.get_recipe(&id)
    }

    fn insert_ingredients(&self, ingredients: Vec<NewIngredient>) -> Result<()> {
        if ingredients.is_empty() {
            return Ok(());
        }
        let count = ingredients.len();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ingredients (id, recipe_id, name, amount, unit) VALUES (?, ?, ?, ?, ?)",
            )?;
            for ingredient in ingredients {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    ingredient.recipe_id,
                    ingredient.name,
                    ingredient.amount,
                    ingredient.unit,
                ])?;
            }
        }
        tx.commit()?;
        info!(count, "inserted ingredients");
        Ok(())
    }
}
