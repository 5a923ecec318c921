use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::viewer;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    pub server: ServerConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Path to the batch table CSV (`Batch,batch_count,portal_status,reason`).
    pub path: PathBuf,
    /// Fall back to the built-in seed fixture when the file is absent.
    /// Intended for local trials and tests, not production.
    #[serde(default = "default_seed_fallback")]
    pub seed_fallback: bool,
}

fn default_seed_fallback() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    /// Key prefix prepended to every document and export key.
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    /// Embedding strategies tried in order when rendering a document.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,
    /// Lifetime of presigned URLs handed to the browser.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            url_ttl_secs: default_url_ttl_secs(),
        }
    }
}

fn default_strategies() -> Vec<String> {
    viewer::STRATEGY_NAMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_url_ttl_secs() -> u64 {
    900
}

impl Config {
    /// Minimal configuration for tests and for running without a config file.
    pub fn minimal() -> Self {
        Self {
            catalog: CatalogConfig {
                path: PathBuf::from("data/Manual_Review.csv"),
                seed_fallback: true,
            },
            storage: None,
            server: ServerConfig {
                bind: "127.0.0.1:7341".to_string(),
            },
            viewer: ViewerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate catalog
    if config.catalog.path.as_os_str().is_empty() {
        anyhow::bail!("catalog.path must not be empty");
    }

    // Validate storage
    if let Some(storage) = &config.storage {
        if storage.bucket.is_empty() {
            anyhow::bail!("storage.bucket must not be empty");
        }
        if storage.region.is_empty() {
            anyhow::bail!("storage.region must not be empty");
        }
    }

    // Validate viewer
    if config.viewer.strategies.is_empty() {
        anyhow::bail!("viewer.strategies must name at least one strategy");
    }
    for name in &config.viewer.strategies {
        if !viewer::STRATEGY_NAMES.contains(&name.as_str()) {
            anyhow::bail!(
                "Unknown viewer strategy: '{}'. Must be one of: {}",
                name,
                viewer::STRATEGY_NAMES.join(", ")
            );
        }
    }
    // S3 caps presigned URL lifetimes at seven days.
    if config.viewer.url_ttl_secs == 0 || config.viewer.url_ttl_secs > 604_800 {
        anyhow::bail!("viewer.url_ttl_secs must be in [1, 604800]");
    }

    Ok(config)
}
