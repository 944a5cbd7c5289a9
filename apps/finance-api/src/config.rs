//! # Finance API Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults            127.0.0.1:8080, ./atlvs-finance.db              │
//! │  2. TOML file           path from ATLVS_CONFIG (optional)              │
//! │  3. Environment         ATLVS_BIND_ADDR, ATLVS_PORT, ATLVS_DB_PATH,    │
//! │                         ATLVS_DB_MAX_CONNECTIONS, ATLVS_FORECAST_MONTHS│
//! │  4. Validation          rejects values that cannot work                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/atlvs/finance.db"
//! max_connections = 8
//! busy_timeout_secs = 5
//!
//! [reports]
//! forecast_months = 12
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use atlvs_core::validation::validate_report_months;
use atlvs_core::DEFAULT_REPORT_MONTHS;
use atlvs_db::DbConfig;

/// Environment variable holding the TOML config path.
pub const CONFIG_PATH_ENV: &str = "ATLVS_CONFIG";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file, created on first start.
    pub path: PathBuf,
    pub max_connections: u32,
    /// Seconds a writer waits for the SQLite write lock.
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("./atlvs-finance.db"),
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Window used by forecast and waterfall when the request has no `months`.
    pub forecast_months: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            forecast_months: DEFAULT_REPORT_MONTHS,
        }
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub reports: ReportSettings,
}

impl ApiConfig {
    /// Loads defaults, then the file at `config_path` (when given), then
    /// process environment overrides, and validates the result.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file; missing sections and keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading finance API config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `ATLVS_*` overrides read through `lookup`.
    ///
    /// Unlike an unset variable, a set but unparseable one is an error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("ATLVS_BIND_ADDR") {
            debug!(bind_addr = %addr, "Overriding bind address from environment");
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("ATLVS_PORT") {
            self.server.port = parse_var("ATLVS_PORT", &port)?;
        }

        if let Some(path) = lookup("ATLVS_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("ATLVS_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("ATLVS_DB_MAX_CONNECTIONS", &max)?;
        }

        if let Some(months) = lookup("ATLVS_FORECAST_MONTHS") {
            self.reports.forecast_months = parse_var("ATLVS_FORECAST_MONTHS", &months)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        validate_report_months(self.reports.forecast_months)
            .map_err(|e| ConfigError::Invalid(format!("reports.{}", e)))?;

        Ok(())
    }

    /// Address the listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = IpAddr::from_str(self.server.bind_addr.trim()).map_err(|_| {
            ConfigError::InvalidValue {
                key: "server.bind_addr".to_string(),
                value: self.server.bind_addr.clone(),
            }
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Pool settings for [`atlvs_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
