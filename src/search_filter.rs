use rusqlite::{types::Value, Connection};

use crate::data_types::{DishType, FilterCriteria, Owner, Recipe, Season};
use crate::db_operations::list_recipes;
use crate::errors::CatalogResult;

/// One narrowing condition. A filter is the conjunction of its predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    DishTypeIs(DishType),
    HasSeason(Season),
    OwnerIs(Owner),
    /// Stored lowercased; matches name OR description.
    Mentions(String),
}

impl Predicate {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let info = &recipe.info;
        match self {
            Predicate::DishTypeIs(dish_type) => info.dish_type == *dish_type,
            Predicate::HasSeason(season) => info.seasons.contains(season),
            // unowned recipes never match an owner filter
            Predicate::OwnerIs(owner) => info.owner == Some(*owner),
            Predicate::Mentions(term) => {
                info.name.to_lowercase().contains(term.as_str())
                    || info.description.to_lowercase().contains(term.as_str())
            }
        }
    }

    fn push_sql(&self, clauses: &mut Vec<&'static str>, params: &mut Vec<Value>) {
        match self {
            Predicate::DishTypeIs(dish_type) => {
                clauses.push("r.dish_type = ?");
                params.push(Value::Text(dish_type.as_str().to_string()));
            }
            Predicate::HasSeason(season) => {
                clauses.push(
                    "EXISTS (SELECT 1 FROM recipe_seasons s WHERE s.recipe_id = r.id AND s.season = ?)",
                );
                params.push(Value::Text(season.as_str().to_string()));
            }
            Predicate::OwnerIs(owner) => {
                clauses.push("r.owner = ?");
                params.push(Value::Text(owner.as_str().to_string()));
            }
            Predicate::Mentions(term) => {
                clauses.push(
                    "(instr(casefold(r.name), ?) > 0 OR instr(casefold(r.description), ?) > 0)",
                );
                params.push(Value::Text(term.clone()));
                params.push(Value::Text(term.clone()));
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    predicates: Vec<Predicate>,
}

impl RecipeFilter {
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let mut predicates = Vec::new();

        if let Some(dish_type) = criteria.dish_type {
            predicates.push(Predicate::DishTypeIs(dish_type));
        }
        if let Some(season) = criteria.season {
            predicates.push(Predicate::HasSeason(season));
        }
        if let Some(owner) = criteria.owner {
            predicates.push(Predicate::OwnerIs(owner));
        }
        // a blank search box is no constraint at all
        if let Some(term) = criteria.search_term.as_deref().map(str::trim) {
            if !term.is_empty() {
                predicates.push(Predicate::Mentions(term.to_lowercase()));
            }
        }

        RecipeFilter { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        self.predicates.iter().all(|p| p.matches(recipe))
    }

    /// `WHERE` clause (empty when unconstrained) and its positional parameters.
    /// Expects the recipes table aliased as `r`.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        for predicate in &self.predicates {
            predicate.push_sql(&mut clauses, &mut params);
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }

    /// Same semantics as the storage query, for recipes already in memory.
    pub fn apply(&self, recipes: &[Recipe]) -> Vec<Recipe> {
        let mut matching: Vec<Recipe> = recipes.iter().filter(|r| self.matches(r)).cloned().collect();
        matching.sort_by(|a, b| a.info.name.cmp(&b.info.name).then(a.id.cmp(&b.id)));
        matching
    }
}

/// All recipes satisfying `criteria`, ordered by name.
pub fn search(conn: &Connection, criteria: &FilterCriteria) -> CatalogResult<Vec<Recipe>> {
    let filter = RecipeFilter::from_criteria(criteria);
    log::debug!("Search with {:?}", filter.predicates());
    list_recipes(conn, &filter)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::data_types::{Difficulty, RecipeInfo};

    fn recipe(id: i64, name: &str, dish_type: DishType, seasons: &[Season]) -> Recipe {
        Recipe {
            id,
            created_at: Utc::now(),
            info: RecipeInfo {
                name: name.to_string(),
                description: "Lekker".to_string(),
                prep_time_minutes: 30,
                difficulty: Difficulty::Easy,
                dish_type,
                seasons: seasons.iter().copied().collect(),
                tags: BTreeSet::new(),
                image_reference: None,
                preparation_steps: Vec::new(),
                serving_count: 2,
                owner: None,
            },
        }
    }

    #[test]
    fn empty_criteria_has_no_predicates() {
        let filter = RecipeFilter::from_criteria(&FilterCriteria::default());
        assert!(filter.predicates().is_empty());
        assert_eq!(filter.to_sql(), (String::new(), Vec::new()));
    }

    #[test]
    fn blank_search_term_is_ignored() {
        let filter = RecipeFilter::from_criteria(&FilterCriteria {
            search_term: Some("   ".to_string()),
            ..Default::default()
        });
        assert!(filter.predicates().is_empty());
    }

    #[test]
    fn sql_joins_clauses_with_and() {
        let filter = RecipeFilter::from_criteria(&FilterCriteria {
            dish_type: Some(DishType::Dessert),
            owner: Some(Owner::Family),
            search_term: Some("Taart".to_string()),
            ..Default::default()
        });
        let (sql, params) = filter.to_sql();

        assert!(sql.starts_with("WHERE r.dish_type = ? AND r.owner = ? AND (instr"));
        assert_eq!(
            params,
            vec![
                Value::Text("Dessert".to_string()),
                Value::Text("Family".to_string()),
                Value::Text("taart".to_string()),
                Value::Text("taart".to_string()),
            ]
        );
    }

    #[test]
    fn dessert_in_winter() {
        let recipes = vec![
            recipe(1, "Appeltaart", DishType::Dessert, &[Season::Winter, Season::Autumn]),
            recipe(2, "Aardbeienijs", DishType::Dessert, &[Season::Summer]),
            recipe(3, "Stamppot", DishType::Dinner, &[Season::Winter]),
        ];
        let filter = RecipeFilter::from_criteria(&FilterCriteria {
            dish_type: Some(DishType::Dessert),
            season: Some(Season::Winter),
            ..Default::default()
        });

        let found = filter.apply(&recipes);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].info.name, "Appeltaart");
    }

    #[test]
    fn search_term_is_case_insensitive_over_name_or_description() {
        let mut soup = recipe(1, "Erwtensoep", DishType::Dinner, &[]);
        soup.info.description = "Met ROOKWORST".to_string();
        let filter = RecipeFilter::from_criteria(&FilterCriteria {
            search_term: Some("rookworst".to_string()),
            ..Default::default()
        });
        assert!(filter.matches(&soup));

        let filter = RecipeFilter::from_criteria(&FilterCriteria {
            search_term: Some("ERWTEN".to_string()),
            ..Default::default()
        });
        assert!(filter.matches(&soup));
    }

    #[test]
    fn unowned_never_matches_owner_filter() {
        let mut owned = recipe(1, "Hutspot", DishType::Dinner, &[]);
        owned.info.owner = Some(Owner::Personal);
        let unowned = recipe(2, "Boerenkool", DishType::Dinner, &[]);

        let filter = RecipeFilter::from_criteria(&FilterCriteria {
            owner: Some(Owner::Personal),
            ..Default::default()
        });
        assert_eq!(filter.apply(&[unowned, owned.clone()]), vec![owned]);
    }

    #[test]
    fn apply_orders_by_name_then_id() {
        let recipes = vec![
            recipe(3, "Poffertjes", DishType::Snack, &[]),
            recipe(2, "Bitterballen", DishType::Snack, &[]),
            recipe(1, "Poffertjes", DishType::Snack, &[]),
        ];
        let ids: Vec<_> = RecipeFilter::default()
            .apply(&recipes)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
