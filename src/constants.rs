use std::sync::OnceLock;

pub const DEFAULT_DB: &str = "recipes.sqlite";
pub static DB_FILENAME: OnceLock<String> = OnceLock::new();

/// Field separator used by the bulk text format, e.g. `500 | gram | spliterwten`
pub const BULK_DELIMITER: char = '|';
/// Separator written between fields when formatting bulk text
pub const BULK_JOINER: &str = " | ";

/// Decimal places kept when scaling ingredient quantities
pub const SCALE_DECIMALS: i32 = 1;
