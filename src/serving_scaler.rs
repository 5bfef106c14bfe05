use rusqlite::Connection;

use crate::constants::SCALE_DECIMALS;
use crate::data_types::{Ingredient, RecipeId};
use crate::db_operations::get_recipe_details;
use crate::errors::{CatalogError, CatalogResult, FieldError};

/// `quantity * target / base`, rounded half away from zero to one decimal.
///
/// The quantity is taken at its shortest decimal spelling and the rounding is
/// done on the exact fraction, so 0.15 for 9 instead of 1 servings gives 1.4.
pub fn scale_quantity(quantity: f64, base_servings: u32, target_servings: u32) -> CatalogResult<f64> {
    if base_servings == 0 {
        return Err(CatalogError::Division);
    }
    if !quantity.is_finite() {
        return Err(CatalogError::Validation(vec![FieldError::new(
            "quantity",
            "must be a finite number",
        )]));
    }

    let factor = 10f64.powi(SCALE_DECIMALS);
    let rounded = decimal_parts(quantity)
        .and_then(|(mantissa, exponent)| {
            round_scaled(mantissa, exponent, base_servings, target_servings)
        })
        .map(|units| units as f64 / factor);

    match rounded {
        Some(scaled) => Ok(scaled),
        None => {
            // outside i128 the value is either far below the last decimal or far
            // beyond f64's integer precision; float rounding is exact there
            let scaled = quantity * f64::from(target_servings) / f64::from(base_servings);
            Ok((scaled * factor).round() / factor)
        }
    }
}

/// Splits a finite `value` into `mantissa * 10^exponent`, taken from its
/// shortest round-trip spelling (`0.15` is `15 * 10^-2`).
fn decimal_parts(value: f64) -> Option<(i128, i32)> {
    let spelled = format!("{:e}", value);
    let (digits, exponent) = spelled.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let mantissa: i128 = format!("{}{}", whole, fraction).parse().ok()?;

    Some((mantissa, exponent - i32::try_from(fraction.len()).ok()?))
}

/// `mantissa * 10^exponent * target / base` in units of the last kept decimal,
/// rounded half away from zero. `None` on i128 overflow.
fn round_scaled(mantissa: i128, exponent: i32, base: u32, target: u32) -> Option<i128> {
    let shift = exponent.checked_add(SCALE_DECIMALS)?;
    let numerator = mantissa.checked_mul(i128::from(target))?;
    let power = 10i128.checked_pow(shift.unsigned_abs())?;

    let (numerator, denominator) = if shift >= 0 {
        (numerator.checked_mul(power)?, i128::from(base))
    } else {
        (numerator, i128::from(base).checked_mul(power)?)
    };

    let doubled = numerator.checked_abs()?.checked_mul(2)?;
    let units = doubled.checked_add(denominator)? / denominator.checked_mul(2)?;
    Some(units * numerator.signum())
}

/// Returns scaled copies of `ingredients`; the input is left untouched.
pub fn scale_ingredients(
    ingredients: &[Ingredient],
    base_servings: u32,
    target_servings: u32,
) -> CatalogResult<Vec<Ingredient>> {
    if target_servings == 0 {
        return Err(CatalogError::Validation(vec![FieldError::new(
            "target_servings",
            "must be at least 1",
        )]));
    }

    ingredients
        .iter()
        .map(|ingredient| -> CatalogResult<Ingredient> {
            Ok(Ingredient {
                quantity: scale_quantity(ingredient.quantity, base_servings, target_servings)?,
                ..ingredient.clone()
            })
        })
        .collect()
}

/// Loads a recipe's ingredients and scales them from its stored serving count.
pub fn scale_recipe_ingredients(
    conn: &Connection,
    recipe_id: RecipeId,
    target_servings: u32,
) -> CatalogResult<Vec<Ingredient>> {
    let details = get_recipe_details(conn, recipe_id)?;
    log::debug!(
        "Scaling recipe {} from {} to {} servings",
        recipe_id,
        details.recipe.info.serving_count,
        target_servings
    );

    scale_ingredients(
        &details.ingredients,
        details.recipe.info.serving_count,
        target_servings,
    )
}
