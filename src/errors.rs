use std::fmt;

use thiserror::Error;

use crate::data_types::RecipeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A problem with one line of bulk text. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid input: {}", join_errors(.0))]
    Validation(Vec<FieldError>),
    #[error("invalid bulk text: {}", join_errors(.0))]
    BulkText(Vec<LineError>),
    #[error("recipe {0} not found")]
    NotFound(RecipeId),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("stored data could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("replacing children of recipe {recipe_id} failed and could not be rolled back: {source}")]
    PartialFailure {
        recipe_id: RecipeId,
        source: rusqlite::Error,
    },
    #[error("cannot scale from a base of zero servings")]
    Division,
}

fn join_errors<T: fmt::Display>(errors: &[T]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type CatalogResult<T> = Result<T, CatalogError>;
