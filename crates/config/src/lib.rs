//! Hive configuration: which bees to start and how the hive is tuned.
//!
//! Config files: `hive.toml`, `hive.yaml`, `hive.yml` or `hive.json`,
//! searched in `./` then `~/.config/hive/`.
//!
//! `${ENV_VAR}` and `${ENV_VAR:-fallback}` are substituted before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config, parse_config},
    schema::{BeeConfig, DEFAULT_EVENT_BUFFER, HiveConfig},
    validate::{Diagnostic, Severity, validate},
};
