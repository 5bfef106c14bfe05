use std::env;

pub fn logger_init(module_path: &str) {
    let crate_level = if env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV)
        .unwrap_or_default()
        == "debug"
    {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("recipe_catalog_rs", crate_level)
        .filter_module(module_path, crate_level)
        .init();
}
