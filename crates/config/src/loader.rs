use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::HiveConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["hive.toml", "hive.yaml", "hive.yml", "hive.json"];

/// Load config from the given path. The format follows the extension.
pub fn load_config(path: &Path) -> Result<HiveConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./hive.{toml,yaml,yml,json}`
/// 2. `~/.config/hive/hive.{toml,yaml,yml,json}`
///
/// Falls back to [`HiveConfig::default`] when nothing is found or the file
/// found does not load.
pub fn discover_and_load() -> HiveConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return HiveConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            HiveConfig::default()
        },
    }
}

/// First existing config file in the standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    find_config_in(Path::new("."))
        .or_else(|| config_dir().and_then(|dir| find_config_in(&dir)))
}

fn find_config_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// The user-global config directory (`~/.config/hive/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hive").map(|d| d.config_dir().to_path_buf())
}

/// Parse already substituted config text; `path` only selects the format.
pub fn parse_config(raw: &str, path: &Path) -> Result<HiveConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}
