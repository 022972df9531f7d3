//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve database path, user scope and logging settings.
//! - Read them from environment variables or a JSON document.
//!
//! # Invariants
//! - Unset values fall back to defaults; set but invalid values are errors.

use crate::logging::{default_log_level, normalize_level, LoggingConfig};
use crate::model::scope::{ScopeError, UserScope};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "TRACKLOG_DB";
pub const ENV_USER_SCOPE: &str = "TRACKLOG_USER";
pub const ENV_LOG_LEVEL: &str = "TRACKLOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TRACKLOG_LOG_DIR";
pub const ENV_LOG_STDERR: &str = "TRACKLOG_LOG_STDERR";

const DEFAULT_DB_FILE: &str = "tracklog.sqlite3";
const DEFAULT_USER_SCOPE: &str = "local";

#[derive(Debug)]
pub enum ConfigError {
    InvalidScope(ScopeError),
    InvalidLogLevel(String),
    InvalidFlag { key: &'static str, value: String },
    InvalidJson(serde_json::Error),
    /// Relative log directory could not be resolved.
    Io(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidScope(err) => write!(f, "{err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidFlag { key, value } => {
                write!(f, "`{key}` must be true or false, got `{value}`")
            }
            Self::InvalidJson(err) => write!(f, "invalid config document: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidScope(err) => Some(err),
            Self::InvalidJson(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidLogLevel(_) | Self::InvalidFlag { .. } => None,
        }
    }
}

impl From<ScopeError> for ConfigError {
    fn from(value: ScopeError) -> Self {
        Self::InvalidScope(value)
    }
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub user_scope: String,
    pub log_level: String,
    /// File logging is off when unset.
    pub log_dir: Option<PathBuf>,
    pub log_to_stderr: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            user_scope: DEFAULT_USER_SCOPE.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            log_to_stderr: false,
        }
    }
}

impl CoreConfig {
    /// Reads `TRACKLOG_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(scope) = value(ENV_USER_SCOPE) {
            config.user_scope = scope.trim().to_string();
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = value(ENV_LOG_STDERR) {
            config.log_to_stderr = parse_flag(ENV_LOG_STDERR, &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON config document; missing keys take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::InvalidJson)?;
        config.validate()?;
        Ok(config)
    }

    pub fn scope(&self) -> Result<UserScope, ConfigError> {
        Ok(UserScope::parse(&self.user_scope)?)
    }

    /// Logging settings, `None` when no log directory is configured.
    ///
    /// A relative directory is resolved against the working directory.
    pub fn logging(&self) -> Result<Option<LoggingConfig>, ConfigError> {
        let Some(dir) = &self.log_dir else {
            return Ok(None);
        };
        Ok(Some(LoggingConfig {
            level: self.log_level.clone(),
            log_dir: absolutize(dir)?,
            duplicate_to_stderr: self.log_to_stderr,
        }))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.scope()?;
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(())
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
    Ok(cwd.join(path))
}
