use rand::Rng;
use rusqlite::Connection;

use crate::data_types::{FilterCriteria, Recipe};
use crate::db_operations::{count_recipes, recipe_at};
use crate::errors::CatalogResult;
use crate::search_filter::RecipeFilter;

/// One recipe drawn uniformly from everything matching `criteria`, or `None`
/// if nothing matches. Every call draws again.
pub fn pick_random(conn: &Connection, criteria: &FilterCriteria) -> CatalogResult<Option<Recipe>> {
    pick_random_with(conn, criteria, &mut rand::thread_rng())
}

/// Same as [`pick_random`] with a caller-supplied random source.
///
/// Works on a plain connection and inside a transaction the caller already
/// holds; in the latter case that transaction provides the consistent view.
pub fn pick_random_with<R: Rng + ?Sized>(
    conn: &Connection,
    criteria: &FilterCriteria,
    rng: &mut R,
) -> CatalogResult<Option<Recipe>> {
    let filter = RecipeFilter::from_criteria(criteria);

    // count and offset lookup have to see the same rows
    let tx = if conn.is_autocommit() {
        Some(conn.unchecked_transaction()?)
    } else {
        None
    };

    let candidates = count_recipes(conn, &filter)?;
    if candidates == 0 {
        log::debug!("No candidates for {:?}", filter.predicates());
        return Ok(None);
    }

    let offset = rng.gen_range(0..candidates);
    let picked = recipe_at(conn, &filter, offset)?;
    if let Some(tx) = tx {
        tx.commit()?;
    }

    log::debug!("Picked offset {} of {} candidates", offset, candidates);
    Ok(picked)
}
