use crate::core::{ReportError, Result};
use crate::reports::ReportThresholds;
use crate::table::OutputFormat;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Database opened when neither the command line nor the config names one.
pub const DEFAULT_DATABASE: &str = "data.sqlite";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub thresholds: ReportThresholds,
    pub output: OutputConfig,
}

/// How the command-line driver prints each report.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Config {
    /// The configured database, or [`DEFAULT_DATABASE`].
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }
}

/// Parses and validates configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).map_err(|e| ReportError::Config(e.to_string()))?;
    config.thresholds.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = salesreport::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// `<config dir>/salesreport/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("salesreport").join("config.toml"))
}

/// Loads the default config file when it exists, defaults otherwise.
pub fn load_default_config() -> Result<Config> {
    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!("Loading configuration from {}", path.display());
            load_config(path)
        }
        _ => Ok(Config::default()),
    }
}
