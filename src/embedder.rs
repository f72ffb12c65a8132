//! Embedder - text to fixed-length vector
//!
//! Embedding backends for the semantic paragraph index:
//! - HTTP (Ollama or OpenAI-compatible local servers)
//! - Token-hash embeddings (blake3 bag-of-words, offline/testing)
//!
//! One index must use one embedder for its whole lifetime: vector
//! dimensionality is fixed per backend configuration and shared by
//! every paragraph and query.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Embedding Configuration
// ============================================================================

/// Preferred embedding backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedderBackend {
    /// Auto-detect: HTTP server if reachable, token-hash otherwise
    #[default]
    Auto,
    /// Ollama-style endpoint (`/api/embeddings`)
    Ollama,
    /// OpenAI-compatible endpoint (`/v1/embeddings`)
    OpenAi,
    /// Offline blake3 token-hash embeddings
    TokenHash,
}

/// Configuration for the embedder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Model name passed to the HTTP backend
    pub model: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Preferred backend
    pub backend: EmbedderBackend,
    /// Endpoint for the HTTP backend
    pub endpoint: String,
    /// Normalize embeddings to unit vectors
    pub normalize: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimension: 768,
            backend: EmbedderBackend::Auto,
            endpoint: "http://localhost:11434/api/embeddings".to_string(),
            normalize: true,
            timeout_secs: 30,
        }
    }
}

// ============================================================================
// Embedder Trait
// ============================================================================

/// Trait for embedding implementations
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Get backend name
    fn backend(&self) -> &str;
}

/// Build an embedder from configuration, probing for availability in
/// `Auto` mode.
pub fn build_embedder(config: &EmbedderConfig) -> Arc<dyn Embedder> {
    match config.backend {
        EmbedderBackend::Ollama => {
            info!("Using Ollama embedder at {}", config.endpoint);
            Arc::new(HttpEmbedder::new(config.clone(), EmbedWire::Ollama))
        }
        EmbedderBackend::OpenAi => {
            info!("Using OpenAI-compatible embedder at {}", config.endpoint);
            Arc::new(HttpEmbedder::new(config.clone(), EmbedWire::OpenAi))
        }
        EmbedderBackend::TokenHash => {
            info!("Using token-hash embedder (dim={})", config.dimension);
            Arc::new(TokenHashEmbedder::new(config.dimension))
        }
        EmbedderBackend::Auto => {
            let http = HttpEmbedder::new(config.clone(), EmbedWire::Ollama);
            if http.is_available() {
                info!("Auto-detected embedding server at {}", config.endpoint);
                Arc::new(http)
            } else {
                warn!(
                    "No embedding server at {}, using token-hash embeddings",
                    config.endpoint
                );
                Arc::new(TokenHashEmbedder::new(config.dimension))
            }
        }
    }
}

// ============================================================================
// Token-Hash Embedder (offline fallback)
// ============================================================================

/// Deterministic bag-of-words embeddings: each token is blake3-hashed
/// into a bucket of the output vector. Word overlap between two texts
/// shows up as vector proximity, which is enough for offline use and
/// for exercising the index in tests.
pub struct TokenHashEmbedder {
    dimension: usize,
}

impl TokenHashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl Embedder for TokenHashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in Self::tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
            // Signed contribution so unrelated tokens cancel rather than pile up
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket % self.dimension] += sign;
        }

        normalize(&mut vector);
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.par_iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend(&self) -> &str {
        "token-hash"
    }
}

// ============================================================================
// HTTP Embedder (Ollama / OpenAI compatible)
// ============================================================================

/// Wire format spoken by the HTTP embedding endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedWire {
    /// `{model, prompt}` -> `{embedding: [...]}`
    Ollama,
    /// `{model, input}` -> `{data: [{embedding: [...]}]}`
    OpenAi,
}

/// Embedder backed by a local HTTP embedding server
pub struct HttpEmbedder {
    config: EmbedderConfig,
    wire: EmbedWire,
    timeout: Duration,
}

impl HttpEmbedder {
    pub fn new(config: EmbedderConfig, wire: EmbedWire) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            config,
            wire,
            timeout,
        }
    }

    /// Probe the endpoint with a tiny request
    pub fn is_available(&self) -> bool {
        self.embed("ping").is_ok()
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let payload = match self.wire {
            EmbedWire::Ollama => serde_json::json!({
                "model": self.config.model,
                "prompt": text,
            }),
            EmbedWire::OpenAi => serde_json::json!({
                "model": self.config.model,
                "input": text,
            }),
        };

        let response = ureq::post(&self.config.endpoint)
            .timeout(self.timeout)
            .set("Content-Type", "application/json")
            .send_json(&payload)
            .context("Failed to send embedding request")?;

        let json: serde_json::Value = response
            .into_json()
            .context("Failed to parse embedding response")?;

        let array = match self.wire {
            EmbedWire::Ollama => json["embedding"].as_array(),
            EmbedWire::OpenAi => json["data"][0]["embedding"].as_array(),
        };

        let mut vector: Vec<f32> = array
            .context("No embedding in response")?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        if self.config.normalize {
            normalize(&mut vector);
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn backend(&self) -> &str {
        match self.wire {
            EmbedWire::Ollama => "http-ollama",
            EmbedWire::OpenAi => "http-openai",
        }
    }
}

// ============================================================================
// Vector Utilities
// ============================================================================

/// Normalize a vector to unit length in place
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Euclidean (L2) distance between two vectors
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

// ============================================================================
// Tests
// ============================================================================
