//! Ollama generate API provider.
//!
//! Non-streaming `POST {base_url}/api/generate`; the completion text is the
//! `response` field of the JSON body.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, TextGenerator};

const PROVIDER: &str = "ollama";

/// Ollama text-generation provider.
pub struct OllamaProvider {
    client: Client,
    config: LlmConfig,
}

impl OllamaProvider {
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.api_url("api/generate");
        let body = GenerateRequest {
            model: &self.config.model,
            prompt: &req.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: req.temperature.or(Some(self.config.temperature)),
                top_p: req.top_p.or(Some(self.config.top_p)),
                num_predict: req.max_tokens.or(Some(self.config.max_tokens)),
            },
        };

        tracing::debug!("Sending request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("Failed to read body: {}", e),
        })?;

        tracing::debug!("Ollama response status: {}", status);

        if !status.is_success() {
            return Err(LlmError::HttpStatus {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body: response_text,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&response_text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("JSON parse error: {}. Raw: {}", e, response_text),
            })?;

        match parsed.response {
            Some(content) if !content.trim().is_empty() => Ok(CompletionResponse { content }),
            Some(_) => Err(LlmError::EmptyResponse {
                provider: PROVIDER.to_string(),
            }),
            None => Err(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "missing 'response' field".to_string(),
            }),
        }
    }
}
