use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::aggregation::{AggregationOptions, DEFAULT_BATCH_SIZE};

/// Configuration file structure for `PipeLens`.
///
/// Holds the connection and aggregation settings so they don't have to be
/// repeated on every run. Command-line flags take precedence over file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Azure DevOps connection
    #[serde(default)]
    pub azure: AzureConfig,

    /// Batching and parallelism of the catalog build
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AzureConfig {
    /// Personal access token
    pub token: Option<String>,

    /// Service root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    pub organization: Option<String>,

    pub project: Option<String>,

    /// REST API version sent as `api-version`
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AggregationConfig {
    /// Pipelines per progress batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pipelines enriched at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Abandon the catalog build after this many seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            organization: None,
            project: None,
            api_version: default_api_version(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            timeout_secs: None,
        }
    }
}

impl AggregationConfig {
    pub fn options(&self) -> AggregationOptions {
        AggregationOptions {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
        }
    }
}

fn default_base_url() -> String {
    "https://dev.azure.com".to_string()
}

fn default_api_version() -> String {
    "7.1".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_concurrency() -> usize {
    1
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipelens.toml
    /// 3. ./pipelens.json
    /// 4. ./pipelens.yaml
    /// 5. ./pipelens.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if path.exists() {
                return Self::load_from_path(path);
            }
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let candidates = ["pipelens.toml", "pipelens.json", "pipelens.yaml", "pipelens.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
