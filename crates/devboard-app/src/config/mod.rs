//! Configuration file parsing for devboard
//!
//! A single `config.toml` holds daemon endpoints, call behavior and tab
//! layout. See [`settings`] for the lookup order.

pub mod settings;
pub mod types;

pub use settings::{
    default_config_path, init_config, load_settings, load_settings_from, parse_settings,
    resolve_config_path, sanitize, validate_endpoint, ConfigSource, CONFIG_ENV_VAR,
    MAX_HISTORY_LIMIT,
};
pub use types::*;
