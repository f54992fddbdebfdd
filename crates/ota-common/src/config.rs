use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::level_filters::LevelFilter;

/// Top-level application configuration.
/// Loaded from an optional config file, environment variables and
/// command line overrides, in that order of precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to. Unset means "resolve the local host name".
    #[serde(default)]
    pub bind: Option<String>,
    /// HTTP port (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (default: text)
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Directory exposed for listing and download.
    /// Defaults to the current working directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub catalog_root: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0} (expected 'text' or 'json')")]
    InvalidLogFormat(String),

    #[error("Catalog directory {}: {source}", .path.display())]
    CatalogRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog directory {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl AppConfig {
    /// Load config from the optional file, `OTA__*` environment variables
    /// and command line overrides.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(file) = &overrides.config_file {
            builder = builder.add_source(config::File::from(file.as_path()));
        }

        let cfg = builder
            .add_source(
                config::Environment::default()
                    .prefix("OTA")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.bind", overrides.bind.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .set_override_option("server.log_level", overrides.log_level.clone())?
            .set_override_option(
                "server.log_format",
                overrides.log_format.map(LogFormat::as_str),
            )?
            .set_override_option(
                "catalog.root",
                overrides
                    .catalog_root
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .build()?;

        let config: AppConfig = cfg.try_deserialize()?;
        // Reject a bad level now rather than when the subscriber is built.
        config.server.level_filter()?;
        Ok(config)
    }
}

impl ServerConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        parse_log_level(&self.log_level)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: None,
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl CatalogConfig {
    /// Canonical catalog directory. Falls back to the working directory.
    pub fn resolve_root(&self) -> Result<PathBuf, ConfigError> {
        let path = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().map_err(|source| ConfigError::CatalogRoot {
                path: PathBuf::from("."),
                source,
            })?,
        };
        canonical_dir(&path)
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let canonical = std::fs::canonicalize(path).map_err(|source| ConfigError::CatalogRoot {
        path: path.to_path_buf(),
        source,
    })?;
    if !canonical.is_dir() {
        return Err(ConfigError::NotADirectory(canonical));
    }
    Ok(canonical)
}

/// Accepts the tracing level names plus the `warning`/`critical`
/// spellings that existing deployment scripts pass.
pub fn parse_log_level(level: &str) -> Result<LevelFilter, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" => Ok(LevelFilter::ERROR),
        _ => Err(ConfigError::InvalidLogLevel(level.to_string())),
    }
}

fn default_port() -> u16 {
    8000
}
fn default_log_level() -> String {
    "info".to_string()
}
