use recipe_catalog_rs::bulk_text::{format_bulk_text, parse_ingredients, parse_side_dishes};
use recipe_catalog_rs::constants::{DB_FILENAME, DEFAULT_DB};
use recipe_catalog_rs::data_types::{
    BulkRecords, DishType, FilterCriteria, NewIngredient, NewSideDish, Owner, RecipeId,
    RecipeInfo, Season,
};
use recipe_catalog_rs::db_operations::{
    check_or_create_db_tables, create_recipe, delete_recipe, get_recipe_details, list_tags,
    open_db, update_recipe,
};
use recipe_catalog_rs::random_pick::pick_random;
use recipe_catalog_rs::search_filter::search;
use recipe_catalog_rs::serving_scaler::scale_recipe_ingredients;
use recipe_catalog_rs::shared_main::logger_init;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

/// Recipe catalog: search, pick at random, scale servings and maintain recipes.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// SQLite database holding the catalog
    #[arg(long, env = "RECIPE_DB", default_value = DEFAULT_DB)]
    db: String,
    /// Enable verbose logging (query composition, timings){n}[SETS env: RUST_LOG=debug]
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tables if they do not exist yet
    Init,
    /// List matching recipes by name
    Search(Criteria),
    /// Pick one matching recipe at random
    Random(Criteria),
    /// Show a recipe with ingredients and side dishes
    Show { id: RecipeId },
    /// Ingredients recalculated for another number of servings
    Scale { id: RecipeId, servings: u32 },
    /// Print ingredients and side dishes as editable bulk text
    EditText { id: RecipeId },
    /// Create a recipe from a JSON document
    Import { file: PathBuf },
    /// Overwrite a recipe and its children from a JSON document
    Update { id: RecipeId, file: PathBuf },
    /// Delete a recipe including its ingredients and side dishes
    Delete { id: RecipeId },
    /// All tags in use
    Tags,
}

#[derive(ClapArgs, Debug)]
struct Criteria {
    #[arg(long)]
    dish_type: Option<DishType>,
    #[arg(long)]
    season: Option<Season>,
    #[arg(long)]
    owner: Option<Owner>,
    /// Substring of name or description, case insensitive
    #[arg(short, long)]
    query: Option<String>,
}

impl From<Criteria> for FilterCriteria {
    fn from(criteria: Criteria) -> Self {
        FilterCriteria {
            dish_type: criteria.dish_type,
            season: criteria.season,
            owner: criteria.owner,
            search_term: criteria.query,
        }
    }
}

/// Recipe fields plus children as bulk text, the way the admin form submits them.
#[derive(Deserialize, Serialize, Debug)]
struct RecipeDocument {
    #[serde(flatten)]
    recipe: RecipeInfo,
    #[serde(default)]
    ingredients: String,
    #[serde(default)]
    side_dishes: String,
}

#[derive(Serialize)]
struct EditText {
    ingredients: String,
    side_dishes: String,
}

fn main() -> Result<()> {
    //// Args setup
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    logger_init(module_path!());
    DB_FILENAME.get_or_init(|| args.db.clone());

    //// DB setup
    let mut conn = open_db().with_context(|| format!("Cannot open {}", args.db))?;
    check_or_create_db_tables(&conn)?;

    let now = Instant::now();
    match args.command {
        Command::Init => log::info!("Database {} ready", args.db),
        Command::Search(criteria) => print_json(&search(&conn, &criteria.into())?)?,
        Command::Random(criteria) => match pick_random(&conn, &criteria.into())? {
            Some(recipe) => print_json(&recipe)?,
            None => log::warn!("No recipe matches"),
        },
        Command::Show { id } => print_json(&get_recipe_details(&conn, id)?)?,
        Command::Scale { id, servings } => {
            print_json(&scale_recipe_ingredients(&conn, id, servings)?)?
        }
        Command::EditText { id } => {
            let details = get_recipe_details(&conn, id)?;
            let ingredients = details.ingredients.iter().map(NewIngredient::from).collect();
            let side_dishes = details.side_dishes.iter().map(NewSideDish::from).collect();

            print_json(&EditText {
                ingredients: format_bulk_text(&BulkRecords::Ingredients(ingredients)),
                side_dishes: format_bulk_text(&BulkRecords::SideDishes(side_dishes)),
            })?
        }
        Command::Import { file } => {
            let doc = read_document(&file)?;
            let ingredients = parse_ingredients(&doc.ingredients)?;
            let side_dishes = parse_side_dishes(&doc.side_dishes)?;

            let id = create_recipe(&mut conn, &doc.recipe, &ingredients, &side_dishes)?;
            println!("{}", id);
        }
        Command::Update { id, file } => {
            let doc = read_document(&file)?;
            let ingredients = parse_ingredients(&doc.ingredients)?;
            let side_dishes = parse_side_dishes(&doc.side_dishes)?;

            update_recipe(&mut conn, id, &doc.recipe, &ingredients, &side_dishes)?;
        }
        Command::Delete { id } => delete_recipe(&conn, id)?,
        Command::Tags => print_json(&list_tags(&conn)?)?,
    }
    log::debug!("Done in {:.2?}", now.elapsed());

    Ok(())
}

fn read_document(file: &Path) -> Result<RecipeDocument> {
    let text = fs::read_to_string(file).with_context(|| format!("Cannot read {:?}", file))?;
    serde_json::from_str(&text).with_context(|| format!("{:?} is not a valid recipe document", file))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
