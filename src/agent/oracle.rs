//! Text-completion oracle - the planning half of the ReAct loop
//!
//! One request carries the full transcript-so-far, a stop sequence for
//! the next iteration marker, and a short output cap. Sampling is
//! deterministic (temperature 0) so a fixed transcript plans the same
//! action every time.

use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A single completion request
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// Full prompt context (instructions + transcript + cue)
    pub context: String,
    /// Generation stops at the first of these sequences
    pub stop: Vec<String>,
    /// Output length cap
    pub max_tokens: u32,
}

/// Stateless request/response completion service
pub trait CompletionOracle: Send + Sync {
    fn complete(&self, request: &OracleRequest) -> Result<String>;
}

// ============================================================================
// HTTP Oracle (OpenAI-compatible chat completions)
// ============================================================================

/// Configuration for the HTTP oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Chat-completions endpoint
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the bearer token, if the endpoint
    /// requires one (empty = no auth header)
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Oracle backed by an OpenAI-compatible chat-completions server
pub struct HttpOracle {
    config: OracleConfig,
    timeout: Duration,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self { config, timeout }
    }
}

impl CompletionOracle for HttpOracle {
    fn complete(&self, request: &OracleRequest) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.context },
            ],
            "temperature": 0,
            "top_p": 1,
            "frequency_penalty": 0.0,
            "presence_penalty": 0.0,
            "max_tokens": request.max_tokens,
            "stop": request.stop,
        });

        let mut call = ureq::post(&self.config.endpoint)
            .timeout(self.timeout)
            .set("Content-Type", "application/json");

        if !self.config.api_key_env.is_empty() {
            if let Ok(key) = std::env::var(&self.config.api_key_env) {
                call = call.set("Authorization", &format!("Bearer {}", key));
            }
        }

        let response = call
            .send_json(&payload)
            .context("Failed to send completion request")?;

        let json: serde_json::Value = response
            .into_json()
            .context("Failed to parse completion response")?;

        let text = json["choices"][0]["message"]["content"]
            .as_str()
            .context("No completion text in response")?;

        Ok(text.to_string())
    }
}

// ============================================================================
// Scripted Oracle (tests / offline dry runs)
// ============================================================================

/// Replays a fixed sequence of completions and records every request.
/// Once the script runs dry it keeps returning empty completions,
/// which the orchestrator treats like a transport failure.
#[derive(Default)]
pub struct ScriptedOracle {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in order
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().clone()
    }

    /// Number of completion calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl CompletionOracle for ScriptedOracle {
    fn complete(&self, request: &OracleRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        Ok(self.responses.lock().pop().unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================
