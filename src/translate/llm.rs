//! Generative model clients

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{Result, TranslateError};

/// Default bound on a single generation request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Content filter level requested from providers that support one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyThreshold {
    #[default]
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
}

impl SafetyThreshold {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "block_none" => Some(Self::BlockNone),
            "block_only_high" => Some(Self::BlockOnlyHigh),
            "block_medium_and_above" => Some(Self::BlockMediumAndAbove),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BlockNone => "block_none",
            Self::BlockOnlyHigh => "block_only_high",
            Self::BlockMediumAndAbove => "block_medium_and_above",
        }
    }

    fn as_gemini(&self) -> &'static str {
        match self {
            Self::BlockNone => "BLOCK_NONE",
            Self::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            Self::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: None,
        }
    }
}

/// A text-in, text-out generation endpoint.
///
/// Responses are free-form: they may be wrapped in markdown fences or carry
/// commentary around the payload. Callers clean them up.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Name used in logs and cache keys.
    fn provider_name(&self) -> &str;
}

/// Run one generation request, failing with `Timeout` once `limit` elapses.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    options: &GenerationOptions,
    limit: Duration,
) -> Result<String> {
    match tokio::time::timeout(limit, generator.generate(prompt, options)).await {
        Ok(result) => result,
        Err(_) => Err(TranslateError::Timeout(limit)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LlmProvider {
    Gemini,
    OpenAI,
    Claude,
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "openai" => Self::OpenAI,
            "claude" | "anthropic" => Self::Claude,
            "ollama" => Self::Ollama,
            _ => Self::Gemini,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Claude => "claude",
            Self::Ollama => "ollama",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    pub fn default_base_url(&self) -> &str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Claude => "https://api.anthropic.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAI => "gpt-4o-mini",
            Self::Claude => "claude-sonnet-4-20250514",
            Self::Ollama => "llama3",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    /// Sent as Gemini `safetySettings`; other providers have no equivalent.
    pub safety: SafetyThreshold,
}

impl LlmConfig {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            provider,
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            safety: SafetyThreshold::default(),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_base_url(mut self, url: Option<String>) -> Self {
        if let Some(u) = url {
            self.base_url = u;
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(m) = model {
            self.model = m;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_safety(mut self, safety: SafetyThreshold) -> Self {
        self.safety = safety;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

const GEMINI_HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmClient {
    /// Build a client. A provider that needs a key and has none is a
    /// configuration error, reported before any request is made.
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(TranslateError::Configuration(format!(
                "API key required for {}",
                config.provider.name()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                TranslateError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    fn map_send_error(&self, err: reqwest::Error) -> TranslateError {
        if err.is_timeout() {
            TranslateError::Timeout(self.config.timeout)
        } else {
            TranslateError::Transport(err.to_string())
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(TranslateError::Transport(format!(
            "{} request failed ({}): {}",
            self.config.provider.name(),
            status,
            body
        )))
    }

    fn gemini_request(&self, prompt: &str, options: &GenerationOptions) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
            safety_settings: GEMINI_HARM_CATEGORIES
                .iter()
                .map(|category| GeminiSafetySetting {
                    category: *category,
                    threshold: self.config.safety.as_gemini(),
                })
                .collect(),
        }
    }

    async fn generate_gemini(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = self.gemini_request(prompt, options);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_deref().unwrap_or_default())])
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = self.check_status(response).await?;

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        let text: String = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(TranslateError::Transport(
                "No response text from Gemini".to_string(),
            ));
        }
        Ok(text)
    }

    async fn generate_openai_compatible(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let request = OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let mut req = self.client.post(&url).json(&request);

        if let Some(ref key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.send().await.map_err(|e| self.map_send_error(e))?;
        let response = self.check_status(response).await?;

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Transport(format!("Failed to parse API response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TranslateError::Transport("No response from API".to_string()))
    }

    async fn generate_ollama(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_output_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = self.check_status(response).await?;

        let result: OllamaResponse = response.json().await.map_err(|e| {
            TranslateError::Transport(format!("Failed to parse Ollama response: {e}"))
        })?;

        Ok(result.response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        match self.config.provider {
            LlmProvider::Gemini => self.generate_gemini(prompt, options).await,
            LlmProvider::OpenAI | LlmProvider::Claude => {
                self.generate_openai_compatible(prompt, options).await
            }
            LlmProvider::Ollama => self.generate_ollama(prompt, options).await,
        }
    }

    fn provider_name(&self) -> &str {
        self.config.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(LlmProvider::from_str("Anthropic"), LlmProvider::Claude);
        assert_eq!(LlmProvider::from_str("ollama"), LlmProvider::Ollama);
        assert_eq!(LlmProvider::from_str("unknown"), LlmProvider::Gemini);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = LlmClient::new(LlmConfig::new(LlmProvider::Gemini))
            .err()
            .expect("should fail without key");
        assert!(matches!(err, TranslateError::Configuration(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let client = LlmClient::new(LlmConfig::new(LlmProvider::Ollama)).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_config_overrides() {
        let config = LlmConfig::new(LlmProvider::OpenAI)
            .with_base_url(Some("http://localhost:8080/v1".into()))
            .with_model(None)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_safety_setting_reaches_gemini_body() {
        let config = LlmConfig::new(LlmProvider::Gemini)
            .with_api_key(Some("k".into()))
            .with_safety(SafetyThreshold::BlockMediumAndAbove);
        let client = LlmClient::new(config).unwrap();
        let request = client.gemini_request("hi", &GenerationOptions::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["safetySettings"][2]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "hi".into(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.3,
                max_output_tokens: Some(100),
            },
            safety_settings: vec![GeminiSafetySetting {
                category: "HARM_CATEGORY_HARASSMENT",
                threshold: SafetyThreshold::BlockNone.as_gemini(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }
}
