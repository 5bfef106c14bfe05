pub mod bulk_text;
pub mod child_replace;
pub mod constants;
pub mod data_types;
pub mod db_operations;
pub mod errors;
pub mod random_pick;
pub mod search_filter;
pub mod serving_scaler;
pub mod shared_main;
pub mod validation;
