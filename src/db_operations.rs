use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{
    functions::FunctionFlags, params, params_from_iter, types::Value, Connection, OptionalExtension,
    Row,
};

use crate::{
    child_replace::swap_children,
    constants::{DB_FILENAME, DEFAULT_DB},
    data_types::{
        Difficulty, DishType, Ingredient, NewIngredient, NewSideDish, Owner, Recipe, RecipeDetails,
        RecipeId, RecipeInfo, Season, SideDish,
    },
    errors::{CatalogError, CatalogResult},
    search_filter::RecipeFilter,
    validation::ensure_valid,
};

const RECIPE_COLUMNS: &str = "r.id, r.name, r.description, r.prep_time_minutes, r.difficulty,
    r.dish_type,
    (SELECT group_concat(s.season, ',') FROM recipe_seasons s WHERE s.recipe_id = r.id),
    r.tags, r.image_reference, r.preparation_steps, r.serving_count, r.owner, r.created_at";

// deterministic, so identical filters list in identical order
const RECIPE_ORDER: &str = "ORDER BY r.name, r.id";

pub fn open_db() -> rusqlite::Result<Connection> {
    let path = DB_FILENAME.get().map(String::as_str).unwrap_or(DEFAULT_DB);
    log::debug!("Opening {}", path);

    let conn = Connection::open(path)?;
    prepare_connection(&conn)?;
    Ok(conn)
}

pub fn open_in_memory_db() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare_connection(&conn)?;
    check_or_create_db_tables(&conn)?;
    Ok(conn)
}

fn prepare_connection(conn: &Connection) -> rusqlite::Result<()> {
    // cascading deletes depend on this, sqlite has it off per connection
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // unicode aware lowercasing; sqlite's lower() only folds ascii
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;

    Ok(())
}

pub fn check_or_create_db_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "create table if not exists recipes (
            id integer primary key autoincrement,
            name text not null,
            description text not null,
            prep_time_minutes integer not null check (prep_time_minutes > 0),
            difficulty text not null,
            dish_type text not null,
            tags text not null default '[]',
            image_reference text,
            preparation_steps text not null default '[]',
            serving_count integer not null check (serving_count >= 1),
            owner text,
            created_at text not null
        )",
        [],
    )?;

    conn.execute(
        "create table if not exists recipe_seasons (
            recipe_id integer not null,
            season text not null,
            primary key (recipe_id, season),
            foreign key (recipe_id) references recipes(id) on delete cascade
        )",
        [],
    )?;

    conn.execute(
        "create table if not exists ingredients (
            id integer primary key autoincrement,
            recipe_id integer not null,
            name text not null,
            quantity real not null check (quantity >= 0),
            unit text not null default '',
            note text,
            foreign key (recipe_id) references recipes(id) on delete cascade
        )",
        [],
    )?;

    conn.execute(
        "create table if not exists side_dishes (
            id integer primary key autoincrement,
            recipe_id integer not null,
            name text not null,
            description text not null default '',
            foreign key (recipe_id) references recipes(id) on delete cascade
        )",
        [],
    )?;

    conn.execute(
        "create index if not exists ingredients_by_recipe on ingredients (recipe_id)",
        [],
    )?;
    conn.execute(
        "create index if not exists side_dishes_by_recipe on side_dishes (recipe_id)",
        [],
    )?;

    Ok(())
}

/// Inserts the recipe row first, then its children under the assigned id.
pub fn create_recipe(
    conn: &mut Connection,
    info: &RecipeInfo,
    ingredients: &[NewIngredient],
    side_dishes: &[NewSideDish],
) -> CatalogResult<RecipeId> {
    ensure_valid(info, ingredients, side_dishes)?;

    let tx = conn.transaction()?;
    tx.execute(
        "insert into recipes (name, description, prep_time_minutes, difficulty, dish_type,
            tags, image_reference, preparation_steps, serving_count, owner, created_at)
            values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            info.name,
            info.description,
            info.prep_time_minutes,
            info.difficulty,
            info.dish_type,
            serde_json::to_string(&info.tags)?,
            info.image_reference,
            serde_json::to_string(&info.preparation_steps)?,
            info.serving_count,
            info.owner,
            Utc::now(),
        ],
    )?;
    let recipe_id = tx.last_insert_rowid();

    insert_seasons(&tx, recipe_id, &info.seasons)?;
    swap_children(&tx, recipe_id, ingredients, side_dishes)?;
    tx.commit()?;

    log::info!(
        "Created recipe {} '{}' with {} ingredients, {} side dishes",
        recipe_id,
        info.name,
        ingredients.len(),
        side_dishes.len()
    );
    Ok(recipe_id)
}

/// Rewrites the recipe's fields and swaps both child collections in one transaction.
pub fn update_recipe(
    conn: &mut Connection,
    recipe_id: RecipeId,
    info: &RecipeInfo,
    ingredients: &[NewIngredient],
    side_dishes: &[NewSideDish],
) -> CatalogResult<()> {
    ensure_valid(info, ingredients, side_dishes)?;

    let tx = conn.transaction()?;
    let changed = tx.execute(
        "update recipes
            set name = ?2, description = ?3, prep_time_minutes = ?4, difficulty = ?5,
                dish_type = ?6, tags = ?7, image_reference = ?8, preparation_steps = ?9,
                serving_count = ?10, owner = ?11
            where id = ?1",
        params![
            recipe_id,
            info.name,
            info.description,
            info.prep_time_minutes,
            info.difficulty,
            info.dish_type,
            serde_json::to_string(&info.tags)?,
            info.image_reference,
            serde_json::to_string(&info.preparation_steps)?,
            info.serving_count,
            info.owner,
        ],
    )?;
    if changed == 0 {
        return Err(CatalogError::NotFound(recipe_id));
    }

    tx.execute(
        "delete from recipe_seasons where recipe_id = ?1",
        params![recipe_id],
    )?;
    insert_seasons(&tx, recipe_id, &info.seasons)?;
    swap_children(&tx, recipe_id, ingredients, side_dishes)?;
    tx.commit()?;

    log::info!("Updated recipe {}", recipe_id);
    Ok(())
}

/// Children and seasons go with it through the cascade.
pub fn delete_recipe(conn: &Connection, recipe_id: RecipeId) -> CatalogResult<()> {
    let deleted = conn.execute("delete from recipes where id = ?1", params![recipe_id])?;
    if deleted == 0 {
        return Err(CatalogError::NotFound(recipe_id));
    }

    log::info!("Deleted recipe {}", recipe_id);
    Ok(())
}

pub fn recipe_exists(conn: &Connection, recipe_id: RecipeId) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare_cached("select 1 from recipes where id = ?1")?;
    stmt.exists(params![recipe_id])
}

pub fn get_recipe(conn: &Connection, recipe_id: RecipeId) -> CatalogResult<Recipe> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM recipes r WHERE r.id = ?1",
        RECIPE_COLUMNS
    ))?;

    let row = stmt
        .query_row(params![recipe_id], RecipeRow::from_row)
        .optional()?;

    match row {
        Some(row) => row.into_recipe(),
        None => Err(CatalogError::NotFound(recipe_id)),
    }
}

pub fn get_recipe_details(conn: &Connection, recipe_id: RecipeId) -> CatalogResult<RecipeDetails> {
    let recipe = get_recipe(conn, recipe_id)?;

    Ok(RecipeDetails {
        ingredients: list_ingredients(conn, recipe_id)?,
        side_dishes: list_side_dishes(conn, recipe_id)?,
        recipe,
    })
}

/// Ingredients in the order they were written.
pub fn list_ingredients(conn: &Connection, recipe_id: RecipeId) -> rusqlite::Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, recipe_id, name, quantity, unit, note
            FROM ingredients
            WHERE recipe_id = ?1
            ORDER BY id",
    )?;

    let ingredients = stmt.query_map(params![recipe_id], |row| {
        Ok(Ingredient {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            name: row.get(2)?,
            quantity: row.get(3)?,
            unit: row.get(4)?,
            note: row.get(5)?,
        })
    })?;

    ingredients.collect()
}

pub fn list_side_dishes(conn: &Connection, recipe_id: RecipeId) -> rusqlite::Result<Vec<SideDish>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, recipe_id, name, description
            FROM side_dishes
            WHERE recipe_id = ?1
            ORDER BY id",
    )?;

    let side_dishes = stmt.query_map(params![recipe_id], |row| {
        Ok(SideDish {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
        })
    })?;

    side_dishes.collect()
}

pub fn list_recipes(conn: &Connection, filter: &RecipeFilter) -> CatalogResult<Vec<Recipe>> {
    let (where_clause, params) = filter.to_sql();
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM recipes r {} {}",
        RECIPE_COLUMNS, where_clause, RECIPE_ORDER
    ))?;

    let rows = stmt
        .query_map(params_from_iter(params), RecipeRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(RecipeRow::into_recipe).collect()
}

pub fn count_recipes(conn: &Connection, filter: &RecipeFilter) -> CatalogResult<usize> {
    let (where_clause, params) = filter.to_sql();
    let mut stmt =
        conn.prepare_cached(&format!("SELECT count(*) FROM recipes r {}", where_clause))?;

    let count: i64 = stmt.query_row(params_from_iter(params), |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// The recipe at `offset` within the filtered, name ordered listing.
pub fn recipe_at(
    conn: &Connection,
    filter: &RecipeFilter,
    offset: usize,
) -> CatalogResult<Option<Recipe>> {
    let (where_clause, mut params) = filter.to_sql();
    params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM recipes r {} {} LIMIT 1 OFFSET ?",
        RECIPE_COLUMNS, where_clause, RECIPE_ORDER
    ))?;

    stmt.query_row(params_from_iter(params), RecipeRow::from_row)
        .optional()?
        .map(RecipeRow::into_recipe)
        .transpose()
}

/// Every tag in use, sorted and deduplicated.
pub fn list_tags(conn: &Connection) -> CatalogResult<Vec<String>> {
    let mut stmt = conn.prepare_cached("SELECT tags FROM recipes")?;
    let tag_lists = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tags = BTreeSet::new();
    for tag_list in tag_lists {
        tags.extend(serde_json::from_str::<Vec<String>>(&tag_list)?);
    }

    Ok(tags.into_iter().collect())
}

fn insert_seasons(
    conn: &Connection,
    recipe_id: RecipeId,
    seasons: &BTreeSet<Season>,
) -> rusqlite::Result<()> {
    let mut stmt =
        conn.prepare_cached("insert into recipe_seasons (recipe_id, season) values (?1, ?2)")?;

    for season in seasons {
        stmt.execute(params![recipe_id, season])?;
    }

    Ok(())
}

// raw row, json columns still encoded
struct RecipeRow {
    id: RecipeId,
    name: String,
    description: String,
    prep_time_minutes: u32,
    difficulty: Difficulty,
    dish_type: DishType,
    seasons: Option<String>,
    tags: String,
    image_reference: Option<String>,
    preparation_steps: String,
    serving_count: u32,
    owner: Option<Owner>,
    created_at: DateTime<Utc>,
}

impl RecipeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RecipeRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            prep_time_minutes: row.get(3)?,
            difficulty: row.get(4)?,
            dish_type: row.get(5)?,
            seasons: row.get(6)?,
            tags: row.get(7)?,
            image_reference: row.get(8)?,
            preparation_steps: row.get(9)?,
            serving_count: row.get(10)?,
            owner: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_recipe(self) -> CatalogResult<Recipe> {
        let seasons = match self.seasons {
            Some(seasons) => seasons
                .split(',')
                .map(|label| {
                    label.parse::<Season>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            6,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })
                })
                .collect::<rusqlite::Result<BTreeSet<_>>>()?,
            None => BTreeSet::new(),
        };

        Ok(Recipe {
            id: self.id,
            created_at: self.created_at,
            info: RecipeInfo {
                name: self.name,
                description: self.description,
                prep_time_minutes: self.prep_time_minutes,
                difficulty: self.difficulty,
                dish_type: self.dish_type,
                seasons,
                tags: serde_json::from_str(&self.tags)?,
                image_reference: self.image_reference,
                preparation_steps: serde_json::from_str(&self.preparation_steps)?,
                serving_count: self.serving_count,
                owner: self.owner,
            },
        })
    }
}
