//! # Bot Configuration
//!
//! Where the store lives, how large its pool is, and where logs go.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHELF_DB_PATH=/srv/shelf/books.db                                  │
//! │     SHELF_LOG_LEVEL=debug                                              │
//! │                                                                         │
//! │  2. TOML Config File (--config <path>, or the platform default)        │
//! │     ~/.config/shelf-bot/shelf.toml (Linux)                             │
//! │     ~/Library/Application Support/com.shelf.bot/shelf.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     platform data dir, 5 connections, 20000 KiB cache                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # shelf.toml
//! [database]
//! path = "/srv/shelf/books.db"
//! max_connections = 5
//! cache_size_kib = 20000
//! busy_timeout_secs = 5
//!
//! [logging]
//! level = "info,shelf=debug,sqlx=warn"
//! dir = "/var/log/shelf"
//! file_prefix = "bot.log"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use shelf_db::pool::DEFAULT_CACHE_SIZE_KIB;
use shelf_db::DbConfig;

/// Default `EnvFilter` directive when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info,shelf=debug,sqlx=warn";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "shelf", "bot")
}

// =============================================================================
// Database Settings
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; created on first start.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Per-connection page cache, in KiB.
    #[serde(default = "default_cache_size_kib")]
    pub cache_size_kib: u32,

    /// How long a writer waits on a locked database.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("shelf.db"))
        .unwrap_or_else(|| PathBuf::from("./shelf.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_cache_size_kib() -> u32 {
    DEFAULT_CACHE_SIZE_KIB
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            cache_size_kib: default_cache_size_kib(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive. `RUST_LOG` still wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for the daily rolling log file.
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// File name prefix; the date is appended on rotation.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

fn default_file_prefix() -> String {
    "bot.log".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_log_level(),
            dir: default_log_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

// =============================================================================
// Bot Config
// =============================================================================

/// Complete process configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Something that happened while loading, kept until logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNotice {
    FileLoaded(PathBuf),
    FileMissing(PathBuf),
    Override { key: &'static str },
    InvalidOverride { key: &'static str, value: String },
}

impl ConfigNotice {
    /// Emits the notice at its level.
    pub fn log(&self) {
        match self {
            ConfigNotice::FileLoaded(path) => info!(?path, "Loaded config from file"),
            ConfigNotice::FileMissing(path) => {
                debug!(?path, "Config file not found, using defaults")
            }
            ConfigNotice::Override { key } => debug!(key, "Setting overridden from environment"),
            ConfigNotice::InvalidOverride { key, value } => {
                warn!(key, value = %value, "Ignoring invalid environment override")
            }
        }
    }
}

impl BotConfig {
    /// Loads configuration: defaults, then the TOML file, then the environment.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    /// Notices are logged right away, so call this once tracing is set up.
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let (config, notices) = Self::load_with_notices(config_path)?;
        notices.iter().for_each(ConfigNotice::log);
        Ok(config)
    }

    /// Like [`load`](Self::load) but hands the notices back instead of
    /// logging them. The process loads its config before tracing exists.
    pub fn load_with_notices(
        config_path: Option<PathBuf>,
    ) -> AppResult<(Self, Vec<ConfigNotice>)> {
        let mut config = Self::default();
        let mut notices = Vec::new();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
                notices.push(ConfigNotice::FileLoaded(path));
            } else {
                notices.push(ConfigNotice::FileMissing(path));
            }
        }

        notices.extend(config.apply_overrides(|key| std::env::var(key).ok()));
        config.validate()?;

        Ok((config, notices))
    }

    /// Like [`load`](Self::load) but falls back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("shelf.toml"))
    }

    /// Applies `SHELF_*` overrides from `lookup`.
    ///
    /// Numeric values that don't parse are skipped and reported.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigNotice> {
        let mut notices = Vec::new();

        if let Some(path) = lookup("SHELF_DB_PATH") {
            self.database.path = PathBuf::from(path);
            notices.push(ConfigNotice::Override { key: "SHELF_DB_PATH" });
        }

        for (key, target) in [
            ("SHELF_MAX_CONNECTIONS", &mut self.database.max_connections),
            ("SHELF_CACHE_SIZE_KIB", &mut self.database.cache_size_kib),
        ] {
            let Some(value) = lookup(key) else {
                continue;
            };
            match value.parse::<u32>() {
                Ok(n) => {
                    *target = n;
                    notices.push(ConfigNotice::Override { key });
                }
                Err(_) => notices.push(ConfigNotice::InvalidOverride { key, value }),
            }
        }

        if let Some(dir) = lookup("SHELF_LOG_DIR") {
            self.logging.dir = PathBuf::from(dir);
            notices.push(ConfigNotice::Override { key: "SHELF_LOG_DIR" });
        }

        if let Some(level) = lookup("SHELF_LOG_LEVEL") {
            self.logging.level = level;
            notices.push(ConfigNotice::Override { key: "SHELF_LOG_LEVEL" });
        }

        notices
    }

    /// Rejects settings the store can't start with.
    pub fn validate(&self) -> AppResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(AppError::config("database.path must not be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(AppError::config(
                "database.max_connections must be greater than 0",
            ));
        }

        if self.logging.file_prefix.trim().is_empty() {
            return Err(AppError::config("logging.file_prefix must not be empty"));
        }

        Ok(())
    }

    /// The store configuration these settings describe.
    pub fn db_config(&self) -> DbConfig {
        let db = &self.database;
        DbConfig::new(&db.path)
            .max_connections(db.max_connections)
            .cache_size_kib(db.cache_size_kib)
            .busy_timeout(Duration::from_secs(db.busy_timeout_secs))
    }

    /// Directory holding the database file, if it has one.
    pub fn database_dir(&self) -> Option<&Path> {
        self.database
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BotConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.cache_size_kib, 20_000);
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
        assert!(config.database.path.ends_with("shelf.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.toml");
        std::fs::write(
            &path,
            r#"
                [database]
                path = "/tmp/books.db"
                cache_size_kib = 8000

                [logging]
                level = "warn"
            "#,
        )
        .unwrap();

        let config = BotConfig::load(Some(path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/books.db"));
        assert_eq!(config.database.cache_size_kib, 8000);
        // Unset keys keep their defaults
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.file_prefix, "bot.log");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BotConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.toml");
        std::fs::write(&path, "[database\npath = 1").unwrap();

        assert!(BotConfig::load(Some(path.clone())).is_err());
        // load_or_default falls back instead
        assert_eq!(
            BotConfig::load_or_default(Some(path)).database.max_connections,
            5
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BotConfig::default();
        let notices = config.apply_overrides(env(&[
            ("SHELF_DB_PATH", "/data/shelf.db"),
            ("SHELF_MAX_CONNECTIONS", "2"),
            ("SHELF_CACHE_SIZE_KIB", "not-a-number"),
            ("SHELF_LOG_DIR", "/var/log/shelf"),
            ("SHELF_LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.database.path, PathBuf::from("/data/shelf.db"));
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.cache_size_kib, 20_000);
        assert_eq!(config.logging.dir, PathBuf::from("/var/log/shelf"));
        assert_eq!(config.logging.level, "debug");

        assert!(notices.contains(&ConfigNotice::InvalidOverride {
            key: "SHELF_CACHE_SIZE_KIB",
            value: "not-a-number".to_string(),
        }));
        assert!(notices.contains(&ConfigNotice::Override {
            key: "SHELF_MAX_CONNECTIONS"
        }));
        assert_eq!(notices.len(), 5);
    }

    #[test]
    fn test_load_reports_notices_instead_of_logging() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let (_, notices) = BotConfig::load_with_notices(Some(missing.clone())).unwrap();
        assert_eq!(notices.first(), Some(&ConfigNotice::FileMissing(missing)));

        let path = dir.path().join("shelf.toml");
        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
        let (config, notices) = BotConfig::load_with_notices(Some(path.clone())).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(notices.first(), Some(&ConfigNotice::FileLoaded(path)));
    }

    #[test]
    fn test_config_validation() {
        let mut config = BotConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 1;
        config.database.path = PathBuf::new();
        assert!(config.validate().is_err());

        config.database.path = PathBuf::from("books.db");
        assert!(config.validate().is_ok());
        // A bare file name lives in the working directory
        assert!(config.database_dir().is_none());
    }

    #[test]
    fn test_db_config_carries_settings() {
        let mut config = BotConfig::default();
        config.database.path = PathBuf::from("/tmp/x/books.db");
        config.database.max_connections = 3;
        config.database.busy_timeout_secs = 9;

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/tmp/x/books.db"));
        assert_eq!(db.max_connections, 3);
        assert_eq!(db.busy_timeout, Duration::from_secs(9));
        assert!(db.run_migrations);
        assert_eq!(config.database_dir(), Some(Path::new("/tmp/x")));
    }

    #[test]
    fn test_toml_serialization() {
        let config = BotConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[logging]"));
    }
}
