use clue_core::AppInfo;
use clue_core::model::roster::{DEFAULT_PLAYERS, MAX_PLAYERS, MIN_PLAYERS, Roster, RosterError};
use clue_sync::Method;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_LOG_PATH: &str = "cluesolver.jsonl";

/// Root configuration loaded from YAML.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub players: PlayersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: AppConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.backend.validate()?;
        self.players.validate()?;
        self.logging.normalize();
        Ok(())
    }
}

/// How to run the backend script.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub method: Method,
    /// Replies slower than this are logged at WARN. They are never cut off.
    #[serde(default)]
    pub timeout_warn_ms: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            working_dir: None,
            method: Method::default(),
            timeout_warn_ms: None,
        }
    }
}

impl BackendConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.command.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "backend.command".to_string(),
                message: "command must not be empty".to_string(),
            });
        }
        if self.timeout_warn_ms == Some(0) {
            return Err(ValidationError::InvalidField {
                field: "backend.timeout_warn_ms".to_string(),
                message: "warning threshold must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn default_command() -> String {
    format!("./{}", AppInfo::backend_script())
}

/// Initial roster.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayersConfig {
    #[serde(default = "default_player_count")]
    pub count: usize,
    #[serde(default)]
    pub names: Vec<String>,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        Self {
            count: default_player_count(),
            names: Vec::new(),
        }
    }
}

impl PlayersConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.count) {
            return Err(ValidationError::InvalidField {
                field: "players.count".to_string(),
                message: format!("player count must be between {MIN_PLAYERS} and {MAX_PLAYERS}"),
            });
        }
        if self.names.len() > self.count {
            return Err(ValidationError::InvalidField {
                field: "players.names".to_string(),
                message: format!(
                    "{} names given for {} players",
                    self.names.len(),
                    self.count
                ),
            });
        }
        if let Some(index) = self.names.iter().position(|n| n.trim().is_empty()) {
            return Err(ValidationError::InvalidField {
                field: format!("players.names[{index}]"),
                message: "name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Roster with default card counts and the configured names applied.
    pub fn roster(&self) -> Result<Roster, RosterError> {
        let mut roster = Roster::new(self.count)?;
        for (index, name) in self.names.iter().enumerate() {
            roster.rename(index, name)?;
        }
        Ok(roster)
    }
}

fn default_player_count() -> usize {
    DEFAULT_PLAYERS
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            log_path: default_log_path(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
        if self.log_path.as_os_str().is_empty() {
            self.log_path = default_log_path();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
