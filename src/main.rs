use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use cookbook::config::AppPaths;
use cookbook::errors::{CookbookError, Result};
use cookbook::logging;
use cookbook::route::Route;
use cookbook::storage::RecipeStore;
use cookbook::storage::models::{Between, Difficulty, Ingredient, Recipe, RecipeQuery};
use cookbook::storage::sqlite::SqliteStore;
use cookbook::views::create::{IngredientField, MacroDraft, RecipeDraft, SubmitOutcome};
use cookbook::views::detail::{format_amount, paragraphs};
use cookbook::views::filter::{CALORIES_SPAN, EMPTY_RESULTS, PROTEIN_SPAN};
use cookbook::views::landing::{self, FEATURED_LIMIT, SearchOutcome};

#[derive(Parser)]
#[command(name = "cookbook", version, about = "Browse, search and share recipes")]
struct Cli {
    /// Output results as JSON
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Database file (defaults to $COOKBOOK_HOME/cookbook.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive TUI
    Tui {
        /// Starting route, e.g. /recipes?search=chicken
        route: Option<String>,
    },

    /// List recipes matching the filters
    List {
        /// Title substring (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// easy, medium or hard
        #[arg(short, long)]
        difficulty: Option<String>,

        /// Calories range, LO..HI
        #[arg(long)]
        calories: Option<String>,

        /// Protein range in grams, LO..HI
        #[arg(long)]
        protein: Option<String>,
    },

    /// Show a recipe with its ingredients
    Show {
        /// Recipe ID
        id: String,
    },

    /// Show the featured recipes from the landing page
    Featured,

    /// Check a title search and print where it leads
    Search {
        /// Title substring
        query: String,
    },

    /// Create a recipe
    Add(AddArgs),
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    description: String,

    /// Steps, one paragraph per line
    #[arg(long)]
    instructions: String,

    /// Minutes
    #[arg(long)]
    cooking_time: String,

    #[arg(long)]
    servings: String,

    /// easy, medium or hard
    #[arg(long)]
    difficulty: String,

    #[arg(long)]
    image_url: Option<String>,

    /// NAME:AMOUNT:UNIT, repeatable
    #[arg(short, long = "ingredient", required = true)]
    ingredients: Vec<String>,

    #[arg(long, default_value = "0")]
    calories: String,

    #[arg(long, default_value = "0")]
    protein: String,

    #[arg(long, default_value = "0")]
    carbs: String,

    #[arg(long, default_value = "0")]
    fat: String,
}

#[derive(Serialize)]
struct RecipeWithIngredients<'a> {
    #[serde(flatten)]
    recipe: &'a Recipe,
    ingredients: &'a [Ingredient],
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            if json {
                eprintln!("{}", serde_json::json!({"error": e.to_string()}));
            } else {
                eprintln!("error: {}", e);
            }
            process::exit(1);
        }
    }
}

/// Runs a command; `Ok(false)` means it finished but should exit non-zero.
fn run(cli: Cli) -> Result<bool> {
    let mut paths = AppPaths::from_env()?;
    if let Some(db) = cli.db {
        paths = paths.with_db_path(db);
    }
    let json = cli.json;
    let command = cli.command.unwrap_or(Commands::Tui { route: None });

    if matches!(command, Commands::Tui { .. }) {
        logging::init_file(&paths)?;
    } else {
        logging::init_stderr();
    }

    match command {
        Commands::Tui { route } => {
            let start = match route {
                Some(r) => Route::parse(&r)?,
                None => Route::Landing,
            };
            cookbook::tui::run(&paths, start)?;
            Ok(true)
        }
        Commands::List {
            search,
            difficulty,
            calories,
            protein,
        } => {
            let query = list_query(search, difficulty, calories, protein)?;
            cmd_list(&open_store(&paths)?, &query, json)?;
            Ok(true)
        }
        Commands::Show { id } => {
            cmd_show(&open_store(&paths)?, &id, json)?;
            Ok(true)
        }
        Commands::Featured => {
            cmd_list(&open_store(&paths)?, &RecipeQuery::sample(FEATURED_LIMIT), json)?;
            Ok(true)
        }
        Commands::Search { query } => cmd_search(&open_store(&paths)?, &query, json),
        Commands::Add(args) => {
            let draft = draft_from_args(args)?;
            cmd_add(&open_store(&paths)?, &draft, json)
        }
    }
}

fn open_store(paths: &AppPaths) -> Result<SqliteStore> {
    SqliteStore::open(&paths.db_path)
}

fn parse_difficulty(s: &str) -> Result<Difficulty> {
    Difficulty::parse(s).ok_or_else(|| {
        CookbookError::InvalidInput(format!(
            "unknown difficulty {s:?} (expected easy, medium or hard)"
        ))
    })
}

/// Parses `LO..HI` into an inclusive range.
fn parse_range(s: &str, field: &str) -> Result<Between> {
    let invalid = || CookbookError::InvalidInput(format!("{field} must look like LO..HI, got {s:?}"));
    let (lo, hi) = s.split_once("..").ok_or_else(invalid)?;
    let lo: f64 = lo.trim().parse().map_err(|_| invalid())?;
    let hi: f64 = hi.trim().parse().map_err(|_| invalid())?;
    if lo > hi {
        return Err(CookbookError::InvalidInput(format!(
            "{field} range is empty: {lo} > {hi}"
        )));
    }
    Ok(Between { lo, hi })
}

/// Splits `NAME:AMOUNT:UNIT`. The name may itself contain colons.
fn parse_ingredient(s: &str) -> Result<(String, String, String)> {
    let mut parts = s.rsplitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(unit), Some(amount), Some(name)) => {
            Ok((name.to_string(), amount.to_string(), unit.to_string()))
        }
        _ => Err(CookbookError::InvalidInput(format!(
            "ingredient must look like NAME:AMOUNT:UNIT, got {s:?}"
        ))),
    }
}

fn draft_from_args(args: AddArgs) -> Result<RecipeDraft> {
    let mut draft = RecipeDraft::default();
    draft.title = args.title;
    draft.description = args.description;
    draft.instructions = args.instructions.replace("\\n", "\n");
    draft.cooking_time = args.cooking_time;
    draft.servings = args.servings;
    draft.difficulty = Some(parse_difficulty(&args.difficulty)?);
    draft.image_url = args.image_url.unwrap_or_default();
    draft.macros = MacroDraft {
        calories: args.calories,
        protein: args.protein,
        carbs: args.carbs,
        fat: args.fat,
    };
    fill_ingredients(&mut draft, &args.ingredients)?;
    Ok(draft)
}

fn fill_ingredients(draft: &mut RecipeDraft, rows: &[String]) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        let (name, amount, unit) = parse_ingredient(row)?;
        if i > 0 {
            draft.add_ingredient();
        }
        draft.update_ingredient(i, IngredientField::Name, &name);
        draft.update_ingredient(i, IngredientField::Amount, &amount);
        draft.update_ingredient(i, IngredientField::Unit, &unit);
    }
    Ok(())
}

/// A range equal to the whole slider span adds no condition, as in the TUI.
/// Anything else is used exactly as given, including bounds past the span.
fn range_flag(value: Option<String>, field: &str, span: f64) -> Result<Option<Between>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let range = parse_range(&value, field)?;
    if range.lo == 0.0 && range.hi == span {
        return Ok(None);
    }
    Ok(Some(range))
}

fn list_query(
    search: Option<String>,
    difficulty: Option<String>,
    calories: Option<String>,
    protein: Option<String>,
) -> Result<RecipeQuery> {
    Ok(RecipeQuery {
        title_contains: search.filter(|s| !s.is_empty()),
        difficulty: difficulty.as_deref().map(parse_difficulty).transpose()?,
        calories: range_flag(calories, "calories", CALORIES_SPAN)?,
        protein: range_flag(protein, "protein", PROTEIN_SPAN)?,
        limit: None,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_list(store: &dyn RecipeStore, query: &RecipeQuery, json: bool) -> Result<()> {
    let recipes = store.list_recipes(query)?;

    if json {
        return print_json(&recipes);
    }

    if recipes.is_empty() {
        println!("{}", EMPTY_RESULTS);
        return Ok(());
    }

    for recipe in &recipes {
        print_recipe_row(recipe);
    }
    Ok(())
}

fn cmd_show(store: &dyn RecipeStore, id: &str, json: bool) -> Result<()> {
    let recipe = store.get_recipe(id)?;
    let ingredients = store.ingredients_for(id)?;

    if json {
        return print_json(&RecipeWithIngredients {
            recipe: &recipe,
            ingredients: &ingredients,
        });
    }

    print_recipe_detail(&recipe, &ingredients);
    Ok(())
}

fn cmd_search(store: &dyn RecipeStore, query: &str, json: bool) -> Result<bool> {
    let (success, message, route) = match landing::search(store, query) {
        SearchOutcome::Ignored => {
            return Err(CookbookError::InvalidInput("search query is blank".to_string()));
        }
        SearchOutcome::Failed(reason) => return Err(CookbookError::Io(reason)),
        SearchOutcome::Navigate(route) => (true, format!("Found recipes: {}", route), Some(route)),
        SearchOutcome::NoMatches(alert) => (false, alert.message, None),
    };

    if json {
        print_json(&StatusResponse {
            success,
            message,
            route: route.map(|r| r.to_string()),
            id: None,
        })?;
    } else if let Some(route) = route {
        println!("{}", route);
    } else {
        println!("{}", message);
    }
    Ok(success)
}

fn cmd_add(store: &dyn RecipeStore, draft: &RecipeDraft, json: bool) -> Result<bool> {
    let outcome = draft.submit(store);
    if let SubmitOutcome::Invalid(reason) = &outcome {
        return Err(CookbookError::InvalidInput(reason.clone()));
    }

    let success = matches!(outcome, SubmitOutcome::Created { .. });
    let message = outcome
        .notification()
        .map(|n| n.description.clone())
        .unwrap_or_default();
    let id = match &outcome {
        SubmitOutcome::Created { recipe, .. } | SubmitOutcome::IngredientsFailed { recipe, .. } => {
            Some(recipe.id.clone())
        }
        _ => None,
    };

    if json {
        print_json(&StatusResponse {
            success,
            message,
            route: outcome.navigate().map(|r| r.to_string()),
            id,
        })?;
    } else {
        match id {
            Some(id) => println!("{} ({})", message, id),
            None => println!("{}", message),
        }
    }
    Ok(success)
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn print_recipe_row(recipe: &Recipe) {
    let title = if recipe.title.chars().count() > 40 {
        let cut: String = recipe.title.chars().take(37).collect();
        format!("{cut}...")
    } else {
        recipe.title.clone()
    };
    let m = recipe.macros;
    println!(
        "{}  {:<40} {:>4}m {:<6} {:>5} cal {:>5}g P {:>5}g C {:>5}g F",
        short_id(&recipe.id),
        title,
        recipe.cooking_time,
        recipe.difficulty.label(),
        format_amount(m.calories),
        format_amount(m.protein),
        format_amount(m.carbs),
        format_amount(m.fat),
    );
}

fn print_recipe_detail(recipe: &Recipe, ingredients: &[Ingredient]) {
    let m = recipe.macros;
    println!("ID:          {}", recipe.id);
    println!("Title:       {}", recipe.title);
    println!("Description: {}", recipe.description);
    println!("Image:       {}", recipe.image_or_placeholder());
    println!("Time:        {} mins", recipe.cooking_time);
    println!("Serves:      {} servings", recipe.servings);
    println!("Difficulty:  {}", recipe.difficulty.label());
    println!("Created:     {}", recipe.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Nutrition:   {} cal, {}g protein, {}g carbs, {}g fat",
        format_amount(m.calories),
        format_amount(m.protein),
        format_amount(m.carbs),
        format_amount(m.fat),
    );

    println!("─────────────────────────");
    println!("Ingredients");
    for i in ingredients {
        println!("  {:<28} {} {}", i.name, format_amount(i.amount), i.unit);
    }

    println!("─────────────────────────");
    println!("Instructions");
    for p in paragraphs(&recipe.instructions) {
        println!("{}", p);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range("100..450", "calories").unwrap(),
            Between { lo: 100.0, hi: 450.0 }
        );
        assert_eq!(
            parse_range(" 0 .. 12.5 ", "protein").unwrap(),
            Between { lo: 0.0, hi: 12.5 }
        );
        assert!(parse_range("450..100", "calories").is_err());
        assert!(parse_range("100", "calories").is_err());
        assert!(parse_range("a..b", "calories").is_err());
    }

    #[test]
    fn test_parse_ingredient() {
        assert_eq!(
            parse_ingredient("Olive oil:2:tbsp").unwrap(),
            ("Olive oil".to_string(), "2".to_string(), "tbsp".to_string())
        );
        assert_eq!(
            parse_ingredient("Salt: to taste:0.5:tsp").unwrap(),
            ("Salt: to taste".to_string(), "0.5".to_string(), "tsp".to_string())
        );
        assert!(parse_ingredient("Flour:200").is_err());
    }

    #[test]
    fn test_fill_ingredients_builds_rows() {
        let mut draft = RecipeDraft::default();
        fill_ingredients(
            &mut draft,
            &["Rice:1:cup".to_string(), "Water:2:cup".to_string()],
        )
        .unwrap();
        let rows = draft.ingredients();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Rice");
        assert_eq!(rows[1].amount, "2");
        assert_eq!(rows[1].unit, "cup");
    }

    #[test]
    fn test_list_query_from_flags() {
        let query = list_query(
            Some("soup".to_string()),
            Some("Hard".to_string()),
            Some("0..5000".to_string()),
            Some("10..40".to_string()),
        )
        .unwrap();
        assert_eq!(query.title_contains.as_deref(), Some("soup"));
        assert_eq!(query.difficulty, Some(Difficulty::Hard));
        assert_eq!(query.calories, None);
        assert_eq!(query.protein, Some(Between { lo: 10.0, hi: 40.0 }));

        assert!(list_query(None, Some("extreme".to_string()), None, None).is_err());
    }

    fn add_args(title: &str, ingredients: &[&str]) -> AddArgs {
        AddArgs {
            title: title.to_string(),
            description: "Bright and quick".to_string(),
            instructions: "Marinate.\\nRoast.".to_string(),
            cooking_time: "35".to_string(),
            servings: "4".to_string(),
            difficulty: "Medium".to_string(),
            image_url: None,
            ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
            calories: "410".to_string(),
            protein: "32".to_string(),
            carbs: "0".to_string(),
            fat: "0".to_string(),
        }
    }

    #[test]
    fn test_draft_from_args() {
        let draft = draft_from_args(add_args("Lemon Chicken", &["Chicken:500:g", "Lemon:1:whole"]))
            .unwrap();
        assert_eq!(draft.title, "Lemon Chicken");
        assert_eq!(draft.instructions, "Marinate.\nRoast.");
        assert_eq!(draft.difficulty, Some(Difficulty::Medium));
        assert_eq!(draft.macros.calories, "410");
        assert_eq!(draft.ingredients().len(), 2);
        assert_eq!(draft.ingredients()[1].name, "Lemon");
        assert!(draft.validate().is_ok());

        let mut bad = add_args("Soup", &["Water:1:l"]);
        bad.difficulty = "extreme".to_string();
        assert!(draft_from_args(bad).is_err());
    }

    #[test]
    fn test_list_query_keeps_ranges_past_slider_span() {
        let query = list_query(None, None, Some("6000..8000".to_string()), None).unwrap();
        assert_eq!(query.calories, Some(Between { lo: 6000.0, hi: 8000.0 }));

        let query = list_query(None, None, Some("0..9000".to_string()), Some("0..500".to_string()))
            .unwrap();
        assert_eq!(query.calories, Some(Between { lo: 0.0, hi: 9000.0 }));
        assert_eq!(query.protein, None);
    }

    #[test]
    fn test_short_id_is_char_safe() {
        assert_eq!(short_id("0b7f6c1e-1111"), "0b7f6c1e");
        assert_eq!(short_id("réçëtté-ïd"), "réçëtté-");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_add_and_search_round() {
        let store = SqliteStore::in_memory().unwrap();
        let draft = draft_from_args(add_args("Lemon Chicken", &["Chicken:500:g"])).unwrap();
        assert!(cmd_add(&store, &draft, true).unwrap());
        assert!(cmd_search(&store, "chicken", true).unwrap());
        assert!(!cmd_search(&store, "pasta", true).unwrap());
    }
}
