use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlaygroundError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:latest";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

// Local models can be slow to load.
fn default_timeout_secs() -> u64 {
    300
}

fn default_retry_backoff_ms() -> u64 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub name: String,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            temperature: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_handle_parsing_errors")]
    pub handle_parsing_errors: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            handle_parsing_errors: default_handle_parsing_errors(),
        }
    }
}

fn default_max_iterations() -> usize {
    15
}

fn default_handle_parsing_errors() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebateConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_debate_temperature")]
    pub temperature: f64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            rounds: default_rounds(),
            temperature: default_debate_temperature(),
        }
    }
}

fn default_max_turns() -> usize {
    4
}

fn default_rounds() -> usize {
    2
}

fn default_debate_temperature() -> f64 {
    0.7
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub debate: DebateConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&raw).map_err(|err| {
            PlaygroundError::Config(format!("Failed to parse configuration: {err}"))
        })?;
        Ok(cfg)
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    pub fn apply_env(&mut self) {
        if let Ok(host) = env::var("OLLAMA_HOST") {
            self.server.base_url = normalize_host(&host);
        }
        // OLLAMA_URL wins over OLLAMA_HOST when both are set.
        if let Ok(url) = env::var("OLLAMA_URL") {
            self.server.base_url = normalize_host(&url);
        }
        if let Ok(model) = env::var("OLLAMA_MODEL") {
            self.model.name = model;
        }
        if let Ok(timeout) = env::var("PLAYGROUND_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.server.timeout_secs = parsed;
            }
        }
        if let Ok(retries) = env::var("PLAYGROUND_MAX_RETRIES") {
            if let Ok(parsed) = retries.parse::<u32>() {
                self.server.max_retries = parsed;
            }
        }
        if let Ok(temperature) = env::var("PLAYGROUND_TEMPERATURE") {
            if let Ok(parsed) = temperature.parse::<f64>() {
                self.model.temperature = Some(parsed.clamp(0.0, 2.0));
            }
        }
        if let Ok(iterations) = env::var("PLAYGROUND_MAX_ITERATIONS") {
            if let Ok(parsed) = iterations.parse::<usize>() {
                self.agent.max_iterations = parsed.max(1);
            }
        }
    }
}

/// Accepts `host:port`, `host` or a full URL and returns a URL without a trailing slash.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
