//! Text-generation service integration.
//!
//! The persona talks to a local Ollama-compatible `/api/generate` endpoint.
//! [`TextGenerator`] is the seam the content generator depends on.

mod ollama;
mod provider;

pub use ollama::OllamaProvider;
pub use provider::{CompletionRequest, CompletionResponse, TextGenerator};

use std::sync::Arc;

use crate::config::LlmConfig;

/// Create the text generator described by the configuration.
pub fn create_text_generator(config: &LlmConfig) -> Arc<dyn TextGenerator> {
    tracing::info!(
        "Using Ollama generate API at {} with model {}",
        config.base_url,
        config.model
    );
    Arc::new(OllamaProvider::new(config.clone()))
}
