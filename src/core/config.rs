//! `tldr.toml` configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::corpus::DEFAULT_URL;

pub const CONFIG_FILE: &str = "tldr.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
    pub default_url: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/articles.csv"),
            default_url: DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub path: PathBuf,
    pub save_embeddings: bool,
    pub embeddings_path: PathBuf,
    pub catalog_path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("saved_index/article_index.bin"),
            save_embeddings: false,
            embeddings_path: PathBuf::from("saved_index/article_embeddings.bin"),
            catalog_path: PathBuf::from("saved_index/catalog.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub default_k: usize,
    pub max_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 10,
            max_k: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    pub min_words: usize,
    pub max_sentences: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_words: 40,
            max_sentences: 3,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid default_k: {0} (must be at least 1)")]
    InvalidDefaultK(usize),
    #[error("max_k ({0}) must be at least default_k ({1})")]
    MaxKTooSmall(usize, usize),
    #[error("Invalid min_words: {0} (must be at least 1)")]
    InvalidMinWords(usize),
    #[error("Invalid max_sentences: {0} (must be at least 1)")]
    InvalidMaxSentences(usize),
}

impl Config {
    /// Load `tldr.toml` from `root`, falling back to defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.search.default_k == 0 {
            return Err(ConfigError::InvalidDefaultK(self.search.default_k));
        }
        if self.search.max_k < self.search.default_k {
            return Err(ConfigError::MaxKTooSmall(
                self.search.max_k,
                self.search.default_k,
            ));
        }
        if self.summary.min_words == 0 {
            return Err(ConfigError::InvalidMinWords(self.summary.min_words));
        }
        if self.summary.max_sentences == 0 {
            return Err(ConfigError::InvalidMaxSentences(self.summary.max_sentences));
        }
        Ok(())
    }
}
