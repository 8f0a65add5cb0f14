use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MEMORY_CACHE_CAPACITY: usize = 50;
pub const DEFAULT_FAVICON_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_RESOLVER_WORKERS: usize = 2;
pub const DEFAULT_DISK_CACHE_BUDGET_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Serialize(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Parse(error) => write!(f, "parse error: {error}"),
            Self::Serialize(error) => write!(f, "serialize error: {error}"),
            Self::Invalid(error) => write!(f, "invalid config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub targets_db_path: PathBuf,
    pub config_path: PathBuf,
    pub icon_cache_dir: PathBuf,
    pub memory_cache_capacity: usize,
    pub favicon_timeout_secs: u64,
    pub resolver_workers: usize,
    pub disk_cache_budget_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            targets_db_path: base.join("targets.sqlite3"),
            config_path: base.join("config.toml"),
            icon_cache_dir: base.join("icon-cache"),
            data_dir: base,
            memory_cache_capacity: DEFAULT_MEMORY_CACHE_CAPACITY,
            favicon_timeout_secs: DEFAULT_FAVICON_TIMEOUT_SECS,
            resolver_workers: DEFAULT_RESOLVER_WORKERS,
            disk_cache_budget_bytes: DEFAULT_DISK_CACHE_BUDGET_BYTES,
        }
    }
}

/// Per-user data directory that survives temp cleanup: APPDATA on Windows,
/// XDG data home (or ~/.local/share) elsewhere, temp dir as a last resort.
pub fn stable_app_data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            if !appdata.trim().is_empty() {
                return PathBuf::from(appdata).join("searchfan");
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            if !xdg.trim().is_empty() {
                return PathBuf::from(xdg).join("searchfan");
            }
        }
        if let Ok(home) = std::env::var("HOME") {
            if !home.trim().is_empty() {
                return PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("searchfan");
            }
        }
    }

    std::env::temp_dir().join("searchfan")
}

pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let defaults = Config::default();
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| defaults.config_path.clone());

    if !config_path.exists() {
        let mut config = defaults;
        config.config_path = config_path;
        return Ok(config);
    }

    let raw = std::fs::read_to_string(&config_path)?;
    let mut config: Config =
        toml::from_str(&raw).map_err(|error| ConfigError::Parse(error.to_string()))?;
    config.config_path = config_path;
    validate(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}

pub fn save(config: &Config) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|error| ConfigError::Serialize(error.to_string()))?;
    if let Some(parent) = config.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config.config_path, rendered)?;
    Ok(())
}

pub fn validate(config: &Config) -> Result<(), String> {
    if config.data_dir.as_os_str().is_empty() {
        return Err("data_dir is required".into());
    }

    if config.targets_db_path.as_os_str().is_empty() {
        return Err("targets_db_path is required".into());
    }

    if config.config_path.as_os_str().is_empty() {
        return Err("config_path is required".into());
    }

    if config.icon_cache_dir.as_os_str().is_empty() {
        return Err("icon_cache_dir is required".into());
    }

    if config.memory_cache_capacity < 1 || config.memory_cache_capacity > 4096 {
        return Err("memory_cache_capacity out of range".into());
    }

    if config.favicon_timeout_secs < 1 || config.favicon_timeout_secs > 30 {
        return Err("favicon_timeout_secs out of range".into());
    }

    if config.resolver_workers < 1 || config.resolver_workers > 16 {
        return Err("resolver_workers out of range".into());
    }

    Ok(())
}
