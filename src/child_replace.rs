use rusqlite::{params, Connection};

use crate::data_types::{NewIngredient, NewSideDish, RecipeId};
use crate::db_operations::recipe_exists;
use crate::errors::{CatalogError, CatalogResult};
use crate::validation::ensure_valid_children;

/// Replaces a recipe's whole ingredient and side-dish sets.
///
/// Delete and insert run in one transaction: either the new sets are stored
/// completely or the old ones stay. Concurrent replacements of the same
/// recipe are last-write-wins.
pub fn replace_children(
    conn: &mut Connection,
    recipe_id: RecipeId,
    ingredients: &[NewIngredient],
    side_dishes: &[NewSideDish],
) -> CatalogResult<()> {
    ensure_valid_children(ingredients, side_dishes)?;

    let tx = conn.transaction()?;
    if !recipe_exists(&tx, recipe_id)? {
        return Err(CatalogError::NotFound(recipe_id));
    }

    match swap_children(&tx, recipe_id, ingredients, side_dishes) {
        Ok(()) => {
            tx.commit()?;
            log::info!(
                "Replaced children of recipe {}: {} ingredients, {} side dishes",
                recipe_id,
                ingredients.len(),
                side_dishes.len()
            );
            Ok(())
        }
        Err(e) => {
            log::warn!("Replacing children of recipe {} failed: {}", recipe_id, e);
            if let Err(rollback_err) = tx.rollback() {
                log::error!(
                    "Rollback for recipe {} failed, children in unknown state: {}",
                    recipe_id,
                    rollback_err
                );
                return Err(CatalogError::PartialFailure {
                    recipe_id,
                    source: rollback_err,
                });
            }
            Err(e.into())
        }
    }
}

/// Delete-then-insert of both child sets. Callers must run this inside a transaction.
pub(crate) fn swap_children(
    conn: &Connection,
    recipe_id: RecipeId,
    ingredients: &[NewIngredient],
    side_dishes: &[NewSideDish],
) -> rusqlite::Result<()> {
    conn.execute(
        "delete from ingredients where recipe_id = ?1",
        params![recipe_id],
    )?;
    conn.execute(
        "delete from side_dishes where recipe_id = ?1",
        params![recipe_id],
    )?;

    let mut insert_ingredient = conn.prepare_cached(
        "insert into ingredients (recipe_id, name, quantity, unit, note)
            values (?1, ?2, ?3, ?4, ?5)",
    )?;
    for ingredient in ingredients {
        insert_ingredient.execute(params![
            recipe_id,
            ingredient.name,
            ingredient.quantity,
            ingredient.unit,
            ingredient.note
        ])?;
    }

    let mut insert_side_dish = conn.prepare_cached(
        "insert into side_dishes (recipe_id, name, description)
            values (?1, ?2, ?3)",
    )?;
    for side_dish in side_dishes {
        insert_side_dish.execute(params![recipe_id, side_dish.name, side_dish.description])?;
    }

    Ok(())
}
