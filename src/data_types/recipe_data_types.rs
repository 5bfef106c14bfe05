use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Difficulty, DishType, Owner, RecipeId, Season};

/// The editable part of a recipe, as submitted by the admin write path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeInfo {
    pub name: String,
    pub description: String,
    pub prep_time_minutes: u32,
    pub difficulty: Difficulty,
    pub dish_type: DishType,
    #[serde(default)]
    pub seasons: BTreeSet<Season>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub image_reference: Option<String>,
    #[serde(default)]
    pub preparation_steps: Vec<String>,
    pub serving_count: u32,
    #[serde(default)]
    pub owner: Option<Owner>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub info: RecipeInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub id: i64,
    pub recipe_id: RecipeId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub note: Option<String>,
}

impl From<&Ingredient> for NewIngredient {
    fn from(ingredient: &Ingredient) -> Self {
        NewIngredient {
            name: ingredient.name.clone(),
            quantity: ingredient.quantity,
            unit: ingredient.unit.clone(),
            note: ingredient.note.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewSideDish {
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SideDish {
    pub id: i64,
    pub recipe_id: RecipeId,
    pub name: String,
    pub description: String,
}

impl From<&SideDish> for NewSideDish {
    fn from(side_dish: &SideDish) -> Self {
        NewSideDish {
            name: side_dish.name.clone(),
            description: side_dish.description.clone(),
        }
    }
}

/// A recipe together with its owned child collections.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub side_dishes: Vec<SideDish>,
}
