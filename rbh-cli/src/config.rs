//! Configuration handling for the rbh CLI
//!
//! Supports loading configuration from rbh.toml files with CLI argument overrides.

use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "rbh.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default number of threads handed to the search engine
    #[serde(default = "default_threads")]
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// E-value threshold for reporting hits
    #[serde(default = "default_evalue")]
    pub evalue: f64,

    /// Percent identity threshold for reporting hits
    #[serde(default = "default_per_identity")]
    pub per_identity: f64,

    /// Targets reported per query for each genome in the corpus
    #[serde(default = "default_hits_per_genome")]
    pub hits_per_genome: usize,

    /// Extension of gene files picked up when a directory is given
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Explicit path to the diamond binary (looked up on PATH otherwise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diamond: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// File name for reciprocal best hits, relative to the search directory
    #[serde(default = "default_rbh_output")]
    pub output: String,

    /// File name for the per-genome-pair summary
    #[serde(default = "default_summary_output")]
    pub summary: String,
}

// Default value functions
fn default_threads() -> usize { num_cpus::get() }
fn default_evalue() -> f64 { 1e-3 }
fn default_per_identity() -> f64 { 30.0 }
fn default_hits_per_genome() -> usize { rbh_core::search::DEFAULT_HITS_PER_GENOME }
fn default_extension() -> String { "faa".to_string() }
fn default_rbh_output() -> String { "rbh.tsv".to_string() }
fn default_summary_output() -> String { "rbh_summary.tsv".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { threads: default_threads() }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            evalue: default_evalue(),
            per_identity: default_per_identity(),
            hits_per_genome: default_hits_per_genome(),
            extension: default_extension(),
            diamond: None,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            output: default_rbh_output(),
            summary: default_summary_output(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }
}
