use crate::paths;
use anyhow::{Context, Result};
use dsman_core::dataset::dataset_config_path;
use dsman_core::{Access, AnnexMode, GitLabConfig, Layout};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable prefix; nested keys are separated by `__`
pub const ENV_PREFIX: &str = "DSMAN_";

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub gitlab: GitLabConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub annex: AnnexConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Timeout of requests to hosting sites without a site-specific timeout
    pub timeout_seconds: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AnnexConfig {
    /// Default `addurl` mode
    pub mode: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub default_format: String,
    pub color_enabled: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl Default for AnnexConfig {
    fn default() -> Self {
        Self {
            mode: AnnexMode::default().as_str().to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "human".to_string(),
            color_enabled: true,
        }
    }
}

/// Problems with a configuration key or value
#[derive(Debug, thiserror::Error)]
pub enum ConfigKeyError {
    #[error("Key '{key}' not found")]
    NotFound { key: String },

    #[error("Value at '{key}' is not a simple type")]
    NotSimple { key: String },

    #[error("Invalid key path: {key}")]
    InvalidPath { key: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("No dataset given to store dataset configuration in")]
    NoDataset,
}

impl ConfigKeyError {
    fn invalid_value(key: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration manager that handles XDG-compliant paths and layered configuration
///
/// Layers, lowest precedence first: built-in defaults, the user
/// configuration file, the configuration file of the dataset (when one is
/// given), then `DSMAN_` environment variables.
pub struct ConfigManager {
    config_path: PathBuf,
    dataset: Option<PathBuf>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new ConfigManager with the default user configuration path
    pub fn new() -> Self {
        Self {
            config_path: paths::get_config_path(),
            dataset: None,
        }
    }

    /// Create a ConfigManager with a specific user configuration path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            dataset: None,
        }
    }

    /// Add the configuration layer of the dataset rooted at `root`
    #[must_use]
    pub fn with_dataset(mut self, root: impl Into<PathBuf>) -> Self {
        self.dataset = Some(root.into());
        self
    }

    /// Get the user configuration file path
    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    /// Get the dataset configuration file path, if a dataset is set
    pub fn get_dataset_config_path(&self) -> Option<PathBuf> {
        self.dataset.as_deref().map(dataset_config_path)
    }

    fn figment(&self) -> Figment {
        let mut figment = Figment::new();

        // Layer 1: Defaults
        figment = figment.merge(Serialized::defaults(AppConfig::default()));

        // Layer 2: User config file (if exists)
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // Layer 3: Dataset config file (if exists)
        if let Some(path) = self.get_dataset_config_path()
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration with layered priority: ENV > dataset > user file > defaults
    pub fn load(&self) -> Result<AppConfig> {
        self.figment()
            .extract()
            .context("Failed to load configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value: toml::Value = toml::from_str(&toml::to_string(&self.load()?)?)?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table.get(part).ok_or_else(|| ConfigKeyError::NotFound {
                        key: key.to_string(),
                    })?;
                }
                _ => {
                    return Err(ConfigKeyError::InvalidPath {
                        key: key.to_string(),
                    }
                    .into());
                }
            }
        }

        simple_value(current).ok_or_else(|| {
            ConfigKeyError::NotSimple {
                key: key.to_string(),
            }
            .into()
        })
    }

    /// Set a value in the user configuration file
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.config_path.clone();
        self.write_value(&path, key, value)
    }

    /// Set a value in the dataset configuration file
    pub fn set_in_dataset(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self
            .get_dataset_config_path()
            .ok_or(ConfigKeyError::NoDataset)?;
        self.write_value(&path, key, value)
    }

    fn write_value(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        validate_config_value(key, value)?;

        // Load existing file or start empty
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            return Err(ConfigKeyError::InvalidPath {
                key: key.to_string(),
            }
            .into());
        };

        let mut current = &mut config;
        for part in parents {
            let toml::Value::Table(table) = current else {
                return Err(ConfigKeyError::InvalidPath {
                    key: key.to_string(),
                }
                .into());
            };
            current = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        }
        let toml::Value::Table(table) = current else {
            return Err(ConfigKeyError::InvalidPath {
                key: key.to_string(),
            }
            .into());
        };
        table.insert(last.to_string(), parse_config_value(key, value)?);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(&config)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// List all configuration values
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value = toml::from_str(&toml::to_string(&self.load()?)?)?;

        let mut items = Vec::new();
        collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }
}

fn simple_value(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Recursively collect all key-value pairs from TOML
fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
    if let toml::Value::Table(table) = value {
        for (key, val) in table {
            let new_prefix = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            collect_values(val, new_prefix, items);
        }
    } else if let Some(simple) = simple_value(value) {
        items.push((prefix, simple));
    }
}

/// Site field of a `gitlab.sites.<site>.<field>` key
fn site_field(key: &str) -> Option<&str> {
    let rest = key.strip_prefix("gitlab.sites.")?;
    let (_, field) = rest.rsplit_once('.')?;
    Some(field)
}

/// Validate a configuration value
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigKeyError> {
    match (key, site_field(key)) {
        (_, Some("layout")) => {
            value
                .parse::<Layout>()
                .map_err(|e| ConfigKeyError::invalid_value(key, e))?;
        }
        (_, Some("access")) => {
            value
                .parse::<Access>()
                .map_err(|e| ConfigKeyError::invalid_value(key, e))?;
        }
        (_, Some("timeout")) | ("network.timeout_seconds", _) => {
            let timeout: u64 = value
                .parse()
                .map_err(|_| ConfigKeyError::invalid_value(key, "must be a positive integer"))?;
            if timeout == 0 {
                return Err(ConfigKeyError::invalid_value(key, "must be greater than 0"));
            }
        }
        (_, Some("url")) => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigKeyError::invalid_value(
                    key,
                    "must be an http(s) URL",
                ));
            }
        }
        ("annex.mode", _) => {
            value
                .parse::<AnnexMode>()
                .map_err(|e| ConfigKeyError::invalid_value(key, e))?;
        }
        ("output.default_format", _) => {
            if !matches!(value, "human" | "json" | "csv") {
                return Err(ConfigKeyError::invalid_value(
                    key,
                    "must be one of human, json, csv",
                ));
            }
        }
        ("output.color_enabled", _) => {
            value
                .parse::<bool>()
                .map_err(|_| ConfigKeyError::invalid_value(key, "must be 'true' or 'false'"))?;
        }
        _ => {} // No validation for unknown keys
    }
    Ok(())
}

/// Parse a value to the appropriate TOML type
fn parse_config_value(key: &str, value: &str) -> Result<toml::Value, ConfigKeyError> {
    match (key, site_field(key)) {
        (_, Some("timeout")) | ("network.timeout_seconds", _) => value
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|_| ConfigKeyError::invalid_value(key, "expected integer value")),
        // Site settings and names are strings, even when they look like numbers
        (_, Some(_)) | ("gitlab.default_site", _) => Ok(toml::Value::String(value.to_string())),
        (k, _) if k.ends_with("_enabled") => value
            .parse::<bool>()
            .map(toml::Value::Boolean)
            .map_err(|_| ConfigKeyError::invalid_value(key, "expected boolean value (true/false)")),
        _ => {
            // Try parsing as different types
            if let Ok(b) = value.parse::<bool>() {
                Ok(toml::Value::Boolean(b))
            } else if let Ok(i) = value.parse::<i64>() {
                Ok(toml::Value::Integer(i))
            } else if let Ok(f) = value.parse::<f64>() {
                Ok(toml::Value::Float(f))
            } else {
                Ok(toml::Value::String(value.to_string()))
            }
        }
    }
}

/// Load the configuration that applies to `dataset`, or the user
/// configuration when no dataset is involved
pub fn get_config(dataset: Option<&Path>) -> Result<AppConfig> {
    let manager = match dataset {
        Some(root) => ConfigManager::new().with_dataset(root),
        None => ConfigManager::new(),
    };
    manager.load()
}
