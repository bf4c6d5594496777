//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Default values used when an environment variable is absent.
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 3000;
    pub const DATABASE_PATH: &str = "data/database.sqlite";
    pub const UPLOAD_DIR: &str = "data/uploads";
    pub const MIGRATIONS_DIR: &str = "migrations";
    pub const MAX_UPLOAD_SIZE: usize = 524_288_000; // 500MB per request
    pub const DEV_CORS_ORIGIN: &str = "http://localhost:3000";
    pub const LOG_LEVEL: &str = "info";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Path of the SQLite database file
    pub database_path: PathBuf,
    /// Directory holding uploaded video files
    pub upload_dir: PathBuf,
    /// Directory holding `.sql` migration files
    pub migrations_dir: PathBuf,
    /// Maximum request body size in bytes (default: 500MB)
    pub max_upload_size: usize,
    /// Origin allowed by CORS in development (the UI dev server)
    pub cors_origin: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; relative default paths resolve against the
    /// working directory.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production, default: development)
    /// - `VISTA_HOST`: Server host (default: 127.0.0.1)
    /// - `VISTA_PORT`: Server port (default: 3000)
    /// - `DATABASE_PATH` / `SQLITE_DATABASE_PATH`: SQLite file (default: data/database.sqlite)
    /// - `VISTA_UPLOAD_DIR`: Upload directory (default: data/uploads)
    /// - `VISTA_MIGRATIONS_DIR`: Migration directory (default: migrations)
    /// - `VISTA_MAX_UPLOAD_SIZE`: Max request body in bytes (default: 500MB)
    /// - `VISTA_CORS_ORIGIN`: Extra CORS origin in development (default: http://localhost:3000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("RUST_ENV") {
            Ok(value) => Environment::parse(&value).ok_or(ConfigError::InvalidValue(
                "RUST_ENV must be 'development' or 'production'",
            ))?,
            Err(_) => Environment::Development,
        };

        let host = env::var("VISTA_HOST").unwrap_or_else(|_| defaults::HOST.to_string());

        let port = match env::var("VISTA_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue("VISTA_PORT must be a valid port number"))?,
            Err(_) => defaults::PORT,
        };

        let database_path = env::var("DATABASE_PATH")
            .or_else(|_| env::var("SQLITE_DATABASE_PATH"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(defaults::DATABASE_PATH));

        let upload_dir = env::var("VISTA_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(defaults::UPLOAD_DIR));

        let migrations_dir = env::var("VISTA_MIGRATIONS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(defaults::MIGRATIONS_DIR));

        let max_upload_size = match env::var("VISTA_MAX_UPLOAD_SIZE") {
            Ok(value) => parse_size(&value).ok_or(ConfigError::InvalidValue(
                "VISTA_MAX_UPLOAD_SIZE must be a positive number of bytes",
            ))?,
            Err(_) => defaults::MAX_UPLOAD_SIZE,
        };

        let cors_origin =
            env::var("VISTA_CORS_ORIGIN").unwrap_or_else(|_| defaults::DEV_CORS_ORIGIN.to_string());

        Ok(Config {
            environment,
            host,
            port,
            database_path,
            upload_dir,
            migrations_dir,
            max_upload_size,
            cors_origin,
        })
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Log filter from a `RUST_LOG` value, falling back to INFO when it is unset or invalid.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(defaults::LOG_LEVEL))
}

fn parse_size(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|size| *size > 0)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),
}
