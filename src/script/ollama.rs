use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::generation::SynthesisError;

/// Text-generation backend used by the script synthesizer.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion. `json_mode` asks the model for a JSON object.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        json_mode: bool,
    ) -> Result<String, SynthesisError>;
}

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SynthesisError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
        json_mode: bool,
    ) -> Result<String, SynthesisError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            format: json_mode.then_some("json"),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SynthesisError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    SynthesisError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    SynthesisError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

/// Mock LLM client for testing. Returns a configurable response.
pub struct MockLlmClient {
    response: Result<String, u16>,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            response: Err(status),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _system: &str,
        _json_mode: bool,
    ) -> Result<String, SynthesisError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(SynthesisError::Provider {
                status: *status,
                body: "model not loaded".into(),
            }),
        }
    }
}
