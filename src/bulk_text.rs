//! Bulk text codec for the admin write path.
//!
//! One record per non-blank line, fields separated by `|`:
//!
//! ```text
//! 500 | gram | spliterwten | gedroogd
//! 2 | stuks | uien
//! ```
//!
//! Ingredient lines are `quantity | unit | name | note?`, side-dish lines are
//! `name | description?`. A field containing `|` itself cannot be expressed.

use regex_lite::Regex;
use static_init::dynamic;

use crate::constants::{BULK_DELIMITER, BULK_JOINER};
use crate::data_types::{BulkKind, BulkRecords, NewIngredient, NewSideDish};
use crate::errors::{CatalogError, CatalogResult, LineError};

const INGREDIENT_FIELDS: usize = 4;
const SIDE_DISH_FIELDS: usize = 2;

pub fn parse_bulk_text(kind: BulkKind, text: &str) -> CatalogResult<BulkRecords> {
    match kind {
        BulkKind::Ingredients => parse_ingredients(text).map(BulkRecords::Ingredients),
        BulkKind::SideDishes => parse_side_dishes(text).map(BulkRecords::SideDishes),
    }
}

pub fn format_bulk_text(records: &BulkRecords) -> String {
    match records {
        BulkRecords::Ingredients(ingredients) => format_ingredients(ingredients),
        BulkRecords::SideDishes(side_dishes) => format_side_dishes(side_dishes),
    }
}

pub fn parse_ingredients(text: &str) -> CatalogResult<Vec<NewIngredient>> {
    parse_lines(text, ingredient_from_fields)
}

pub fn parse_side_dishes(text: &str) -> CatalogResult<Vec<NewSideDish>> {
    parse_lines(text, side_dish_from_fields)
}

pub fn format_ingredients(ingredients: &[NewIngredient]) -> String {
    ingredients
        .iter()
        .map(|ingredient| {
            let mut line = [
                ingredient.quantity.to_string(),
                ingredient.unit.clone(),
                ingredient.name.clone(),
            ]
            .join(BULK_JOINER);

            // absent notes are left out entirely, not written as an empty segment
            if let Some(note) = ingredient.note.as_deref().filter(|n| !n.is_empty()) {
                line.push_str(BULK_JOINER);
                line.push_str(note);
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_side_dishes(side_dishes: &[NewSideDish]) -> String {
    side_dishes
        .iter()
        .map(|side_dish| [side_dish.name.as_str(), side_dish.description.as_str()].join(BULK_JOINER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs `build` on the trimmed fields of every non-blank line and gathers
/// either all records or all line errors.
fn parse_lines<T>(
    text: &str,
    build: impl Fn(&[&str]) -> Result<T, String>,
) -> CatalogResult<Vec<T>> {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(BULK_DELIMITER).map(str::trim).collect();
        match build(&fields) {
            Ok(record) => records.push(record),
            Err(message) => errors.push(LineError {
                line: i + 1,
                message,
            }),
        }
    }

    if errors.is_empty() {
        log::debug!("Parsed {} bulk text records", records.len());
        Ok(records)
    } else {
        Err(CatalogError::BulkText(errors))
    }
}

fn ingredient_from_fields(fields: &[&str]) -> Result<NewIngredient, String> {
    if fields.len() > INGREDIENT_FIELDS {
        return Err(format!(
            "expected at most {} fields (quantity | unit | name | note), got {}",
            INGREDIENT_FIELDS,
            fields.len()
        ));
    }

    let quantity = parse_quantity(fields[0])?;
    let unit = fields.get(1).copied().unwrap_or_default();
    let name = fields.get(2).copied().unwrap_or_default();
    if name.is_empty() {
        return Err("ingredient name is missing".to_string());
    }
    let note = fields
        .get(3)
        .filter(|note| !note.is_empty())
        .map(|note| note.to_string());

    Ok(NewIngredient {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
        note,
    })
}

fn side_dish_from_fields(fields: &[&str]) -> Result<NewSideDish, String> {
    if fields.len() > SIDE_DISH_FIELDS {
        return Err(format!(
            "expected at most {} fields (name | description), got {}",
            SIDE_DISH_FIELDS,
            fields.len()
        ));
    }

    let name = fields[0];
    if name.is_empty() {
        return Err("side dish name is missing".to_string());
    }

    Ok(NewSideDish {
        name: name.to_string(),
        description: fields.get(1).copied().unwrap_or_default().to_string(),
    })
}

/// Accepts `500`, `0.5`, `1,5`, `1/2` and `1 1/2`.
pub fn parse_quantity(txt: &str) -> Result<f64, String> {
    #[dynamic]
    static DECIMAL_RE: Regex = Regex::new(r"^(?:\d+(?:[.,]\d+)?|[.,]\d+)$").unwrap();
    #[dynamic]
    static FRACTION_RE: Regex = Regex::new(r"^(?:(\d+)\s+)?(\d+)\s*/\s*(\d+)$").unwrap();

    let invalid = || format!("'{}' is not a valid quantity", txt);

    if DECIMAL_RE.is_match(txt) {
        return txt.replace(',', ".").parse::<f64>().map_err(|_| invalid());
    }

    let caps = FRACTION_RE.captures(txt).ok_or_else(invalid)?;
    let whole = match caps.get(1) {
        Some(m) => m.as_str().parse::<f64>().map_err(|_| invalid())?,
        None => 0.0,
    };
    let numerator = caps[2].parse::<f64>().map_err(|_| invalid())?;
    let denominator = caps[3].parse::<f64>().map_err(|_| invalid())?;
    if denominator == 0.0 {
        return Err(format!("'{}' divides by zero", txt));
    }

    Ok(whole + numerator / denominator)
}
