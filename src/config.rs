//! Configuration Module - user preferences from config.toml
//!
//! Sections:
//! - [oracle]: completion endpoint, model, auth env var
//! - [embedding]: embedding backend, endpoint, dimension
//! - [index]: snapshot directory override
//! - [agent]: iteration budget, retrieval depth, output cap

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentConfig, OracleConfig};
use crate::embedder::EmbedderConfig;
use crate::index::IndexStore;

/// Doc Sage Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion oracle settings
    pub oracle: OracleConfig,
    /// Embedding settings
    pub embedding: EmbedderConfig,
    /// Index snapshot settings
    pub index: IndexConfig,
    /// Reasoning loop settings
    pub agent: AgentConfig,
}

/// Index snapshot settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Snapshot directory (default: platform data dir)
    pub dir: Option<PathBuf>,
}

impl IndexConfig {
    /// Resolved snapshot directory
    pub fn store_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(IndexStore::default_dir)
    }
}

impl Config {
    /// Load config from default path or return defaults
    pub fn load() -> Self {
        Self::load_from(&Self::default_path()).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tunclon", "doc-sage")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".doc-sage")
                    .join("config.toml")
            })
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::default_path().exists()
    }
}

/// Generate a sample config file with comments
pub fn generate_sample_config() -> String {
    r#"# Doc Sage Configuration
# Location: ~/.config/doc-sage/config.toml (or %APPDATA%\doc-sage\config.toml on Windows)

[oracle]
# OpenAI-compatible chat-completions endpoint
endpoint = "http://localhost:1234/v1/chat/completions"

# Model name
model = "gpt-4o-mini"

# Environment variable holding the API key (empty = no auth header)
api_key_env = "OPENAI_API_KEY"

# Request timeout in seconds
timeout_secs = 60

[embedding]
# Backend: "auto", "ollama", "open-ai", or "token-hash"
backend = "auto"

# Embedding endpoint for the HTTP backends
endpoint = "http://localhost:11434/api/embeddings"

# Model name passed to the HTTP backend
model = "nomic-embed-text"

# Embedding dimension
dimension = 768

# Normalize embeddings to unit vectors
normalize = true

# Request timeout in seconds
timeout_secs = 30

[index]
# Snapshot directory override (optional)
# dir = "/home/user/.doc-sage/indexes"

[agent]
# Reasoning iterations per question
max_iterations = 5

# Paragraphs retrieved per Search
top_k = 3

# Output cap per completion request
max_tokens = 100
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.top_k, 3);
        assert_eq!(config.embedding.dimension, 768);
        assert!(config.index.dir.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_config.toml");

        let config = Config::default();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.oracle.model, config.oracle.model);
        assert_eq!(loaded.agent.max_iterations, config.agent.max_iterations);
        assert_eq!(loaded.embedding.backend, config.embedding.backend);
    }

    #[test]
    fn test_parse_sample_config() {
        let sample = generate_sample_config();
        let config: Config = toml::from_str(&sample).unwrap();
        assert_eq!(config.agent.max_iterations, 5);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let partial = "[agent]\nmax_iterations = 9\n";
        let config: Config = toml::from_str(partial).unwrap();

        assert_eq!(config.agent.max_iterations, 9);
        assert_eq!(config.agent.top_k, 3);
        assert_eq!(config.oracle.model, "gpt-4o-mini");
    }

    #[test]
    fn test_store_dir_override() {
        let config = IndexConfig {
            dir: Some(PathBuf::from("/tmp/indexes")),
        };
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/indexes"));
    }
}
