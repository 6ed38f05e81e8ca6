//! Application configuration
//!
//! A TOML file with a `[defaults]` table of parameter values:
//!
//! ```toml
//! [defaults]
//! mirror = "https://mirror.example.org"
//! retries = 2
//! ```
//!
//! Values seed the option mapping of every command before parsing, so a
//! configured value counts as supplied. The file is taken from
//! `$TINYSCRIPT_CONFIG` when set, otherwise from `config.toml` in the
//! platform config directory of the application.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::param::{Params, Value};

/// Overrides the discovered config file
pub const CONFIG_ENV: &str = "TINYSCRIPT_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file named by {CONFIG_ENV} does not exist: {0}")]
    Missing(PathBuf),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parameter values keyed by normalized name
    pub defaults: BTreeMap<String, Value>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to load config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse config")
    }

    /// Default location for an application's config file
    pub fn default_path(app_name: &str) -> Option<PathBuf> {
        ProjectDirs::from("", "", app_name).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the config for `app_name`; an absent default file is an empty config
    pub fn discover(app_name: &str) -> Result<Self> {
        if let Some(path) = env::var_os(CONFIG_ENV).map(PathBuf::from) {
            if !path.exists() {
                return Err(ConfigError::Missing(path).into());
            }
            debug!(path = %path.display(), "loading config from environment");
            return Self::load(&path);
        }
        match Self::default_path(app_name) {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// The defaults as an option mapping
    pub fn params(&self) -> Params {
        self.defaults
            .iter()
            .map(|(name, value)| (name.replace('-', "_"), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_defaults_table() {
        let config = AppConfig::parse(
            r#"
            [defaults]
            mirror = "https://mirror.example.org"
            retries = 2
            dry-run = true
            "#,
        )
        .unwrap();
        let params = config.params();
        assert_eq!(params.str("mirror"), Some("https://mirror.example.org"));
        assert_eq!(params.int("retries"), Some(2));
        assert!(params.dry_run());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn parse_errors_carry_context() {
        let err = AppConfig::parse("[defaults\nx = ").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[defaults]\nout = \"build\"").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.params().str("out"), Some("build"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Path::new("/nonexistent/tinyscript.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
