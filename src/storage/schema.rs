pub const CREATE_RECIPES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS recipes (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        instructions TEXT NOT NULL,
        cooking_time INTEGER NOT NULL CHECK (cooking_time >= 1),
        servings INTEGER NOT NULL CHECK (servings >= 1),
        difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
        image_url TEXT,
        calories REAL NOT NULL,
        protein REAL NOT NULL,
        carbs REAL NOT NULL,
        fat REAL NOT NULL,
        created_at TEXT NOT NULL
    )
";

pub const CREATE_INGREDIENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS ingredients (
        id TEXT PRIMARY KEY,
        recipe_id TEXT NOT NULL,
        name TEXT NOT NULL,
        amount REAL NOT NULL CHECK (amount >= 0),
        unit TEXT NOT NULL,
        FOREIGN KEY (recipe_id) REFERENCES recipes(id)
    )
";

pub const CREATE_INDEX_TITLE: &str =
    "CREATE INDEX IF NOT EXISTS idx_recipes_title ON recipes(title)";

pub const CREATE_INDEX_DIFFICULTY: &str =
    "CREATE INDEX IF NOT EXISTS idx_recipes_difficulty ON recipes(difficulty)";

pub const CREATE_INDEX_RECIPE_ID: &str =
    "CREATE INDEX IF NOT EXISTS idx_ingredients_recipe_id ON ingredients(recipe_id)";
