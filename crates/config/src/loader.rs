use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::KnifeConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "skillknife.toml",
    "skillknife.yaml",
    "skillknife.yml",
    "skillknife.json",
];

static DATA_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<KnifeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./skillknife.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/skillknife/skillknife.{toml,yaml,yml,json}` (user-global)
///
/// Returns `KnifeConfig::default()` if no config file is found or the one
/// found cannot be parsed.
pub fn discover_and_load() -> KnifeConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    KnifeConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/skillknife/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "skillknife").map(|d| d.config_dir().to_path_buf())
}

/// The current user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Directory holding persisted documents and the market mirror cache.
///
/// Uses the override from [`set_data_dir`] when present, otherwise
/// `~/.cache/skill-knife`.
pub fn data_dir() -> PathBuf {
    if let Ok(guard) = DATA_DIR_OVERRIDE.lock()
        && let Some(ref dir) = *guard
    {
        return dir.clone();
    }
    home_dir()
        .map(|h| h.join(".cache").join("skill-knife"))
        .unwrap_or_else(|| PathBuf::from(".skill-knife"))
}

/// Override the data directory for the rest of the process.
pub fn set_data_dir(dir: PathBuf) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.lock() {
        *guard = Some(dir);
    }
}

/// Drop a previous [`set_data_dir`] override.
pub fn clear_data_dir() {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.lock() {
        *guard = None;
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<KnifeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str::<KnifeConfig>(raw).context("invalid TOML config"),
        "yaml" | "yml" => serde_yaml::from_str::<KnifeConfig>(raw).context("invalid YAML config"),
        "json" => serde_json::from_str::<KnifeConfig>(raw).context("invalid JSON config"),
        _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
    }
}
