// ABOUTME: Reader for the flat KEY=VALUE configuration file
// ABOUTME: Builds the typed export configuration from parsed entries

use crate::error::ExporterError;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Default file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "CONFIGFILE";

pub const KEY_DATABASE: &str = "DATABASE";
pub const KEY_USER: &str = "USER";
pub const KEY_HOST: &str = "HOST";
pub const KEY_PORT: &str = "PORT";
pub const KEY_EXPORT_FOLDER: &str = "EXPORTFOLDER";
pub const KEY_DB_SCHEMA: &str = "DBSCHEMA";
pub const KEY_QUERY_TYPE: &str = "QUERYTYPE";
pub const KEY_ENGINE: &str = "ENGINE";

/// Parse `KEY=VALUE` lines into a map
///
/// Only lines containing `=` are kept. Each is split on the first `=`,
/// both halves are trimmed, and a later key overwrites an earlier one.
/// Lines starting with `#` are comments.
///
/// # Examples
///
/// ```
/// # use postgis_shp_exporter::config::parse_config;
/// let entries = parse_config("DATABASE=gis\nUSER=alice\n");
/// assert_eq!(entries["DATABASE"], "gis");
/// assert_eq!(entries["USER"], "alice");
/// ```
pub fn parse_config(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Export settings read from the configuration file
///
/// Every key is optional at parse time; commands call [`ExportConfig::require`]
/// for the ones they need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportConfig {
    pub database: Option<String>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub export_folder: Option<String>,
    pub db_schema: Option<String>,
    pub query_type: Option<String>,
    pub engine: Option<String>,
}

impl ExportConfig {
    pub fn from_entries(mut entries: HashMap<String, String>) -> Self {
        Self {
            database: entries.remove(KEY_DATABASE),
            user: entries.remove(KEY_USER),
            host: entries.remove(KEY_HOST),
            port: entries.remove(KEY_PORT),
            export_folder: entries.remove(KEY_EXPORT_FOLDER),
            db_schema: entries.remove(KEY_DB_SCHEMA),
            query_type: entries.remove(KEY_QUERY_TYPE),
            engine: entries.remove(KEY_ENGINE),
        }
    }

    pub fn parse(text: &str) -> Self {
        Self::from_entries(parse_config(text))
    }

    /// Look up a value by its configuration key
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            KEY_DATABASE => &self.database,
            KEY_USER => &self.user,
            KEY_HOST => &self.host,
            KEY_PORT => &self.port,
            KEY_EXPORT_FOLDER => &self.export_folder,
            KEY_DB_SCHEMA => &self.db_schema,
            KEY_QUERY_TYPE => &self.query_type,
            KEY_ENGINE => &self.engine,
            _ => return None,
        };
        value.as_deref()
    }

    /// Value of a key that must be present
    pub fn require(&self, key: &'static str) -> Result<&str, ExporterError> {
        self.get(key).ok_or(ExporterError::MissingConfigKey(key))
    }
}

/// Load the configuration file at `path`
pub fn load_config(path: &Path) -> Result<ExportConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = ExportConfig::parse(&content);
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
