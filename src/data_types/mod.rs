pub mod recipe_data_types;

use std::{fmt, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use recipe_data_types::{
    Ingredient, NewIngredient, NewSideDish, Recipe, RecipeDetails, RecipeInfo, SideDish,
};

pub type RecipeId = i64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{label}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

// Closed label sets. The first label is the stored form, the rest are accepted
// when parsing (mostly the Dutch names used in the catalog data).
macro_rules! labelled_enum {
    ($name:ident { $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                $(
                    if wanted == $label.to_lowercase() $(|| wanted == $alias.to_lowercase())* {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownLabel {
                    kind: stringify!($name),
                    label: s.to_string(),
                })
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownLabel;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}
labelled_enum!(Difficulty {
    Easy => "Easy" | "Makkelijk",
    Medium => "Medium" | "Gemiddeld",
    Hard => "Hard" | "Moeilijk",
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DishType {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
    Snack,
}
labelled_enum!(DishType {
    Breakfast => "Breakfast" | "Ontbijt",
    Lunch => "Lunch",
    Dinner => "Dinner" | "Diner" | "Hoofdgerecht",
    Dessert => "Dessert" | "Nagerecht" | "Toetje",
    Snack => "Snack" | "Tussendoortje",
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}
labelled_enum!(Season {
    Spring => "Spring" | "Lente",
    Summer => "Summer" | "Zomer",
    Autumn => "Autumn" | "Herfst" | "Fall",
    Winter => "Winter",
});

/// Who a recipe belongs to. Records without an owner are `None` at use sites.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Owner {
    Personal,
    Family,
    Community,
}
labelled_enum!(Owner {
    Personal => "Personal" | "Eigen",
    Family => "Family" | "Familie",
    Community => "Community",
});

/// Optional criteria narrowing a recipe listing. Absent criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub dish_type: Option<DishType>,
    pub season: Option<Season>,
    pub owner: Option<Owner>,
    pub search_term: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BulkKind {
    Ingredients,
    SideDishes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulkRecords {
    Ingredients(Vec<NewIngredient>),
    SideDishes(Vec<NewSideDish>),
}

impl BulkRecords {
    pub fn kind(&self) -> BulkKind {
        match self {
            BulkRecords::Ingredients(_) => BulkKind::Ingredients,
            BulkRecords::SideDishes(_) => BulkKind::SideDishes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BulkRecords::Ingredients(records) => records.len(),
            BulkRecords::SideDishes(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_case_insensitive_and_dutch() {
        assert_eq!("winter".parse::<Season>(), Ok(Season::Winter));
        assert_eq!(" Herfst ".parse::<Season>(), Ok(Season::Autumn));
        assert_eq!("Zomer".parse::<Season>(), Ok(Season::Summer));
        assert_eq!("nagerecht".parse::<DishType>(), Ok(DishType::Dessert));
        assert_eq!("MAKKELIJK".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("familie".parse::<Owner>(), Ok(Owner::Family));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "Brunch".parse::<DishType>().unwrap_err();
        assert_eq!(err.kind, "DishType");
        assert_eq!(err.label, "Brunch");
    }

    #[test]
    fn serde_uses_canonical_label_and_accepts_aliases() {
        assert_eq!(serde_json::to_string(&Season::Autumn).unwrap(), "\"Autumn\"");
        let season: Season = serde_json::from_str("\"Herfst\"").unwrap();
        assert_eq!(season, Season::Autumn);
        assert!(serde_json::from_str::<Season>("\"Moesson\"").is_err());
    }
}
