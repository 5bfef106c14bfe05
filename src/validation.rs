use crate::{
    data_types::{NewIngredient, NewSideDish, RecipeInfo},
    errors::{CatalogError, CatalogResult, FieldError},
};

pub fn validate_recipe(recipe: &RecipeInfo) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if recipe.name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if recipe.description.trim().is_empty() {
        errors.push(FieldError::new("description", "must not be empty"));
    }
    if recipe.prep_time_minutes == 0 {
        errors.push(FieldError::new("prep_time_minutes", "must be at least 1"));
    }
    if recipe.serving_count == 0 {
        errors.push(FieldError::new("serving_count", "must be at least 1"));
    }
    if recipe.tags.iter().any(|tag| tag.trim().is_empty()) {
        errors.push(FieldError::new("tags", "must not contain empty tags"));
    }
    for (i, step) in recipe.preparation_steps.iter().enumerate() {
        if step.trim().is_empty() {
            errors.push(FieldError::new(
                format!("preparation_steps[{}]", i),
                "must not be empty",
            ));
        }
    }

    errors
}

pub fn validate_ingredients(ingredients: &[NewIngredient]) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for (i, ingredient) in ingredients.iter().enumerate() {
        if ingredient.name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("ingredients[{}].name", i),
                "must not be empty",
            ));
        }
        // NaN fails both comparisons, so check finiteness explicitly
        if !ingredient.quantity.is_finite() || ingredient.quantity < 0.0 {
            errors.push(FieldError::new(
                format!("ingredients[{}].quantity", i),
                "must be a non-negative number",
            ));
        }
    }

    errors
}

pub fn validate_side_dishes(side_dishes: &[NewSideDish]) -> Vec<FieldError> {
    side_dishes
        .iter()
        .enumerate()
        .filter(|(_, side_dish)| side_dish.name.trim().is_empty())
        .map(|(i, _)| FieldError::new(format!("side_dishes[{}].name", i), "must not be empty"))
        .collect()
}

pub fn ensure_valid_children(
    ingredients: &[NewIngredient],
    side_dishes: &[NewSideDish],
) -> CatalogResult<()> {
    let mut errors = validate_ingredients(ingredients);
    errors.extend(validate_side_dishes(side_dishes));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Validation(errors))
    }
}

/// Checks a recipe and its children together, so every problem is reported at once.
pub fn ensure_valid(
    recipe: &RecipeInfo,
    ingredients: &[NewIngredient],
    side_dishes: &[NewSideDish],
) -> CatalogResult<()> {
    let mut errors = validate_recipe(recipe);
    errors.extend(validate_ingredients(ingredients));
    errors.extend(validate_side_dishes(side_dishes));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::Validation(errors))
    }
}
