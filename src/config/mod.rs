//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::translate::chunk::DEFAULT_CHUNK_BUDGET;
use crate::translate::direct::DEFAULT_CHUNK_THRESHOLD;
use crate::translate::llm::SafetyThreshold;
use crate::translate::orchestrator::{FanoutPolicy, TranslationSettings};
use crate::translate::retry::RetryPolicy;

const CONFIG_FILE_NAME: &str = "config.toml";
pub const APP_NAME: &str = "htmltrans";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub translation: TranslationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Default API provider (gemini, openai, claude, ollama)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Gemini API key
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[serde(default)]
    pub gemini_api_base: Option<String>,

    /// Gemini model
    #[serde(default)]
    pub gemini_model: Option<String>,

    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL
    #[serde(default)]
    pub openai_api_base: Option<String>,

    /// OpenAI model
    #[serde(default)]
    pub openai_model: Option<String>,

    /// Anthropic API key
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Anthropic API base URL
    #[serde(default)]
    pub anthropic_api_base: Option<String>,

    /// Anthropic model
    #[serde(default)]
    pub anthropic_model: Option<String>,

    /// Content filter level for providers that support one
    #[serde(default)]
    pub safety: SafetyThreshold,

    /// Ollama API base URL
    #[serde(default = "default_ollama_base")]
    pub ollama_api_base: String,

    /// Ollama model
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_ollama_base() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini_api_key: None,
            gemini_api_base: None,
            gemini_model: None,
            openai_api_key: None,
            openai_api_base: None,
            openai_model: None,
            anthropic_api_key: None,
            anthropic_api_base: None,
            anthropic_model: None,
            safety: SafetyThreshold::default(),
            ollama_api_base: default_ollama_base(),
            ollama_model: default_ollama_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Default target language
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Subject area used to steer tone
    #[serde(default)]
    pub domain_hint: Option<String>,

    /// Documents longer than this many characters are translated in chunks
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,

    /// Character budget of one chunk
    #[serde(default = "default_chunk_budget")]
    pub chunk_budget: usize,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,

    /// sequential or parallel
    #[serde(default)]
    pub fanout: FanoutPolicy,

    /// Reuse previously translated documents
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Rounds of retrying failed documents
    #[serde(default = "default_job_attempts")]
    pub job_attempts: u32,
}

fn default_language() -> String {
    "es".to_string()
}

fn default_chunk_threshold() -> usize {
    DEFAULT_CHUNK_THRESHOLD
}

fn default_chunk_budget() -> usize {
    DEFAULT_CHUNK_BUDGET
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    2000
}

fn default_chunk_delay_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    90
}

fn default_document_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_job_attempts() -> u32 {
    3
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            domain_hint: None,
            chunk_threshold: default_chunk_threshold(),
            chunk_budget: default_chunk_budget(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            chunk_delay_ms: default_chunk_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            document_timeout_secs: default_document_timeout_secs(),
            fanout: FanoutPolicy::default(),
            cache: default_true(),
            job_attempts: default_job_attempts(),
        }
    }
}

impl TranslationConfig {
    /// Pipeline settings described by this section.
    pub fn settings(&self) -> TranslationSettings {
        TranslationSettings {
            chunk_threshold: self.chunk_threshold,
            chunk_budget: self.chunk_budget.max(1),
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            retry: RetryPolicy {
                max_attempts: self.max_attempts.max(1),
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
                attempt_timeout: Duration::from_secs(self.document_timeout_secs.max(1)),
            },
            fanout: self.fanout,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config path")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let dir = Self::config_dir().context("Could not determine config directory")?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content).context("Failed to write config file")?;

        Ok(path)
    }

    /// Get API key for the specified provider
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        match provider.to_lowercase().as_str() {
            "gemini" => self
                .api
                .gemini_api_key
                .clone()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .or_else(|| std::env::var("GOOGLE_API_KEY").ok()),
            "openai" => self
                .api
                .openai_api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
            "claude" | "anthropic" => self
                .api
                .anthropic_api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok()),
            _ => None,
        }
    }

    /// Get API base URL for the specified provider
    pub fn get_api_base(&self, provider: &str) -> Option<String> {
        match provider.to_lowercase().as_str() {
            "gemini" => self.api.gemini_api_base.clone(),
            "openai" => self.api.openai_api_base.clone(),
            "claude" | "anthropic" => self.api.anthropic_api_base.clone(),
            "ollama" => Some(self.api.ollama_api_base.clone()),
            _ => None,
        }
    }

    /// Get model for the specified provider
    pub fn get_model(&self, provider: &str) -> Option<String> {
        match provider.to_lowercase().as_str() {
            "gemini" => self.api.gemini_model.clone(),
            "openai" => self.api.openai_model.clone(),
            "claude" | "anthropic" => self.api.anthropic_model.clone(),
            "ollama" => Some(self.api.ollama_model.clone()),
            _ => None,
        }
    }
}
