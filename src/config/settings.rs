//! TOML-based configuration for Joinery.
//!
//! Supports a config file (joinery.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [query]
//! dialect = "tsql"
//! quote_identifiers = true
//! row_limit = 1000
//! constants_name = "Literals"
//!
//! [connections.production]
//! driver = "mssql"
//! connection_string = "${PROD_DB_CONNECTION_STRING}"
//! default_schema = "dbo"
//!
//! [connections.dev]
//! driver = "duckdb"
//! connection_string = "./data/dev.duckdb"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::metadata::DataSource;
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Defaults applied to new queries.
    pub query: QuerySettings,

    /// Named database connections.
    pub connections: HashMap<String, ConnectionSettings>,
}

/// Defaults for newly created queries.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Database family the SQL is generated for.
    pub dialect: Dialect,

    /// Quote column and table names with the dialect's quote when no live
    /// connection reports one.
    pub quote_identifiers: bool,

    /// Row limit handed to the execution layer.
    pub row_limit: Option<u64>,

    /// Row limit for streaming execution.
    pub streaming_row_limit: Option<u64>,

    /// Display name of the constants pseudo-table.
    pub constants_name: String,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            quote_identifiers: false,
            row_limit: None,
            streaming_row_limit: None,
            constants_name: "Constants".to_string(),
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database driver (postgres, mysql, mssql, duckdb, snowflake, oracle).
    pub driver: String,

    /// Connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Default schema for this connection.
    #[serde(default)]
    pub default_schema: Option<String>,
}

impl ConnectionSettings {
    /// Get the database family for the driver.
    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        Dialect::from_driver(&self.driver)
            .ok_or_else(|| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.connection_string)
    }

    /// Resolve into the data source handed to metadata providers.
    pub fn to_data_source(&self, name: &str) -> Result<DataSource, SettingsError> {
        self.dialect()?;
        Ok(DataSource {
            name: name.to_string(),
            driver: self.driver.clone(),
            connection_string: self.resolved_connection_string()?,
            default_schema: self.default_schema.clone(),
        })
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `JOINERY_CONFIG`
    /// 2. `./joinery.toml`
    /// 3. `~/.config/joinery/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("JOINERY_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("joinery.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("joinery").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if it exists, else the first
    /// by name).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections
            .iter()
            .min_by_key(|(name, _)| name.as_str())
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a named connection to a data source.
    pub fn data_source(&self, name: &str) -> Result<DataSource, SettingsError> {
        self.get_connection(name)?.to_data_source(name)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut var_name = String::new();
        if braced {
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
