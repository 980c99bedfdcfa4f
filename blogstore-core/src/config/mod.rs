//! Configuration management for blogstore
//!
//! Configuration comes from defaults, an optional TOML file and
//! `BLOGSTORE_<SECTION>_<KEY>` environment overrides, in that order.

use crate::core_post::{MemoryBackend, Params, PostBackend, SqliteBackend, StorageResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "BLOGSTORE";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub events: EventsConfig,
    pub module: ModuleConfig,
}

/// Storage substrate selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    Memory,
    Sqlite,
}

impl FromStr for StoreBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackendKind::Memory),
            "sqlite" => Ok(StoreBackendKind::Sqlite),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackendKind,

    /// Database file (sqlite backend only)
    pub path: PathBuf,

    /// Maximum pooled connections
    pub pool_size: u32,

    /// How long a connection waits on a locked database
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

/// Event delivery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Events buffered per subscriber before the slowest one lags
    pub channel_capacity: usize,
}

/// Module-level settings applied at genesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Only identity allowed to update params
    pub authority: String,

    /// Params in effect until the authority first changes them
    pub params: Params,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::Sqlite,
            path: PathBuf::from("./data/blogstore.db"),
            pool_size: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
        }
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            authority: "gov".to_string(),
            params: Params::default(),
        }
    }
}

impl StoreConfig {
    /// Open the configured substrate
    pub fn open_backend(&self) -> StorageResult<Box<dyn PostBackend>> {
        Ok(match self.backend {
            StoreBackendKind::Memory => Box::new(MemoryBackend::new()),
            StoreBackendKind::Sqlite => {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Box::new(SqliteBackend::open(
                    &self.path,
                    self.pool_size,
                    self.busy_timeout,
                )?)
            }
        })
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid_value(key, e))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: BLOGSTORE_<SECTION>_<KEY>
    /// Example: BLOGSTORE_STORE_PATH=/var/lib/blogstore/posts.db
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BLOGSTORE_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let key = format!("{}_{}", ENV_PREFIX, suffix);
            lookup(&key).map(|value| (key, value))
        };

        // Store config
        if let Some((key, value)) = var("STORE_BACKEND") {
            self.store.backend = parse_var(&key, &value)?;
        }
        if let Some((_, value)) = var("STORE_PATH") {
            self.store.path = PathBuf::from(value);
        }
        if let Some((key, value)) = var("STORE_POOL_SIZE") {
            self.store.pool_size = parse_var(&key, &value)?;
        }
        if let Some((key, value)) = var("STORE_BUSY_TIMEOUT") {
            self.store.busy_timeout = humantime_serde::re::humantime::parse_duration(&value)
                .map_err(|e| ConfigError::invalid_value(&key, e))?;
        }

        // Logging config
        if let Some((_, value)) = var("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some((key, value)) = var("LOG_JSON") {
            self.logging.json_format = parse_var(&key, &value)?;
        }

        // Events config
        if let Some((key, value)) = var("EVENTS_CHANNEL_CAPACITY") {
            self.events.channel_capacity = parse_var(&key, &value)?;
        }

        // Module config
        if let Some((_, value)) = var("MODULE_AUTHORITY") {
            self.module.authority = value;
        }
        if let Some((key, value)) = var("MODULE_MAX_TITLE_LENGTH") {
            self.module.params.max_title_length = parse_var(&key, &value)?;
        }
        if let Some((key, value)) = var("MODULE_MAX_BODY_LENGTH") {
            self.module.params.max_body_length = parse_var(&key, &value)?;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise defaults, then apply environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        if self.store.backend == StoreBackendKind::Sqlite
            && self.store.path.as_os_str().is_empty()
        {
            return Err(ConfigError::ValidationFailed(
                "sqlite backend requires a database path".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "channel_capacity must be greater than 0".to_string(),
            ));
        }

        if self.module.authority.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "module authority must not be empty".to_string(),
            ));
        }

        self.module
            .params
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, StoreBackendKind::Sqlite);
        assert_eq!(config.module.params, Params::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.store.pool_size = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.module.authority = " ".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.module.params.max_body_length = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.events.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("BLOGSTORE_STORE_BACKEND", "memory"),
                ("BLOGSTORE_STORE_BUSY_TIMEOUT", "250ms"),
                ("BLOGSTORE_LOG_JSON", "true"),
                ("BLOGSTORE_MODULE_AUTHORITY", "council"),
                ("BLOGSTORE_MODULE_MAX_TITLE_LENGTH", "64"),
            ]))
            .unwrap();

        assert_eq!(config.store.backend, StoreBackendKind::Memory);
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
        assert!(config.logging.json_format);
        assert_eq!(config.module.authority, "council");
        assert_eq!(config.module.params.max_title_length, 64);
    }

    #[test]
    fn test_env_override_rejects_bad_value() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("BLOGSTORE_STORE_POOL_SIZE", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("BLOGSTORE_STORE_POOL_SIZE"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blogstore.toml");

        let mut config = Config::default();
        config.store.busy_timeout = Duration::from_secs(2);
        config.module.authority = "council".to_string();
        config.save_to_file(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("busy_timeout = \"2s\""));

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.store.backend, StoreBackendKind::Memory);
        assert_eq!(config.store.pool_size, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_open_memory_backend() {
        let mut config = StoreConfig::default();
        config.backend = StoreBackendKind::Memory;
        let backend = config.open_backend().unwrap();
        assert_eq!(backend.read_counter().unwrap(), 0);
    }

    #[test]
    fn test_open_sqlite_backend_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("nested").join("posts.db"),
            ..StoreConfig::default()
        };

        config.open_backend().unwrap();
        assert!(config.path.exists());
    }
}
