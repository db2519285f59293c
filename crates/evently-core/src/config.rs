//! Evently Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development. The token signing secret is the
//! only value without a default: startup fails when it is missing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default Argon2 time cost
pub const DEFAULT_HASH_COST_FACTOR: u32 = 12;

/// Default session token lifetime
pub const DEFAULT_TOKEN_TTL: &str = "7d";

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_VAR: &str = "EVENTLY_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Credential and session token settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// When `EVENTLY_CONFIG` names a TOML file it is read first and the
    /// environment is applied on top of it.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(lookup)
    }

    /// Load from a TOML file
    ///
    /// Missing sections and keys keep their defaults. The result is not
    /// validated until the environment has been applied.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Apply key overrides on top of this config, then validate
    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }

        // PostgreSQL
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.postgres_url = Some(url);
        }
        if let Some(size) = lookup("DATABASE_POOL_SIZE") {
            self.database.pool_size = parse_value("DATABASE_POOL_SIZE", size)?;
        }

        // Auth
        if let Some(cost) = lookup("HASH_COST_FACTOR") {
            self.auth.hash_cost_factor = parse_value("HASH_COST_FACTOR", cost)?;
        }
        if let Some(secret) = lookup("TOKEN_SIGNING_SECRET") {
            self.auth.token_signing_secret = secret;
        }
        if let Some(ttl) = lookup("TOKEN_TTL") {
            self.auth.token_ttl = ttl;
        }
        if let Some(timeout) = lookup("AUTH_LOOKUP_TIMEOUT_MS") {
            self.auth.lookup_timeout_ms = parse_value("AUTH_LOOKUP_TIMEOUT_MS", timeout)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        self.auth.validate()?;
        Ok(self)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL (in-memory store when unset)
    pub postgres_url: Option<String>,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            pool_size: 10,
        }
    }
}

/// Credential and session token configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Argon2 time cost used when hashing new passwords
    pub hash_cost_factor: u32,

    /// Shared HMAC secret for session tokens
    pub token_signing_secret: String,

    /// Session token lifetime, e.g. "7d", "12h", "3600"
    pub token_ttl: String,

    /// Upper bound on the credential lookup during token validation
    pub lookup_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            hash_cost_factor: DEFAULT_HASH_COST_FACTOR,
            token_signing_secret: String::new(),
            token_ttl: DEFAULT_TOKEN_TTL.to_string(),
            lookup_timeout_ms: 5000,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("hash_cost_factor", &self.hash_cost_factor)
            .field("token_signing_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("lookup_timeout_ms", &self.lookup_timeout_ms)
            .finish()
    }
}

impl AuthConfig {
    /// Build a config with the given secret and defaults elsewhere
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            token_signing_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Parsed session token lifetime
    pub fn ttl(&self) -> Result<Duration, ConfigError> {
        parse_ttl(&self.token_ttl)
    }

    /// Bound applied to the credential lookup
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Check required and well-formed values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_signing_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "TOKEN_SIGNING_SECRET".to_string(),
            ));
        }
        if self.hash_cost_factor == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HASH_COST_FACTOR".to_string(),
                value: self.hash_cost_factor.to_string(),
            });
        }
        self.ttl()?;
        Ok(())
    }
}

/// Parse a duration string such as `"7d"`, `"12h"`, `"30m"`, `"45s"` or `"3600"`
///
/// A bare integer is a number of seconds. Supported units are `s`, `m`, `h`,
/// `d` and `w`. Whitespace between the number and the unit is allowed.
pub fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "TOKEN_TTL".to_string(),
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
