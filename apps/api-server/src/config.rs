//! Centralized configuration for api-server.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than at request time.

use axum::http::HeaderValue;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Store selected by the `DATABASE_URL` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// `memory://`: in-memory storage (data lost on restart)
    Memory,
    /// `sqlite://<path>`: SQLite file-based storage
    Sqlite(PathBuf),
}

impl StoreConfig {
    fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.eq_ignore_ascii_case("memory") || url.eq_ignore_ascii_case("memory://") {
            return Ok(Self::Memory);
        }
        match url.strip_prefix("sqlite://") {
            Some(path) if !path.is_empty() => Ok(Self::Sqlite(PathBuf::from(path))),
            Some(_) => Err(ConfigError {
                field: "DATABASE_URL",
                message: "sqlite:// requires a file path".into(),
            }),
            None => Err(ConfigError {
                field: "DATABASE_URL",
                message: format!("unsupported connection string '{}'", url),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Store connection
    pub store: StoreConfig,
    /// CORS allow origin
    pub cors_allow_origin: HeaderValue,
    /// Log format
    pub log_format: LogFormat,
    /// Directory served for unmatched GET paths
    pub public_dir: PathBuf,
    /// Landing page served at `/`
    pub index_file: PathBuf,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Result<Self, ConfigError> {
        // Port
        let port = match get("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError {
                field: "PORT",
                message: format!("'{}' is not a valid port", s),
            })?,
            None => 3000,
        };

        // Store
        let store = StoreConfig::parse(
            &get("DATABASE_URL").unwrap_or_else(|| "sqlite://./data/exercise.db".into()),
        )?;
        #[cfg(not(feature = "sqlite"))]
        if matches!(store, StoreConfig::Sqlite(_)) {
            return Err(ConfigError {
                field: "DATABASE_URL",
                message: "sqlite support not compiled in; use memory://".into(),
            });
        }

        // CORS allow origin
        let cors_origin_str = get("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".into());
        let cors_allow_origin = if cors_origin_str == "*" {
            HeaderValue::from_static("*")
        } else {
            HeaderValue::from_str(&cors_origin_str).map_err(|e| ConfigError {
                field: "CORS_ALLOW_ORIGIN",
                message: format!("Invalid header value '{}': {}", cors_origin_str, e),
            })?
        };

        // Log format
        let log_format = LogFormat::from_str(&get("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        // Static files
        let public_dir = PathBuf::from(get("PUBLIC_DIR").unwrap_or_else(|| "public".into()));
        let index_file =
            PathBuf::from(get("INDEX_FILE").unwrap_or_else(|| "views/index.html".into()));

        Ok(Self {
            port,
            store,
            cors_allow_origin,
            log_format,
            public_dir,
            index_file,
        })
    }
}
