/// Declarative TOML configuration (root document plus agent/task catalogs).
pub mod toml_config;
