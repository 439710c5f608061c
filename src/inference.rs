//! Inference service boundary
//!
//! Exposes text generation behind a trait so the session loop can run
//! against any backend. The real backend is a Hugging Face style
//! text-generation endpoint reached over a long-lived reqwest::Client
//! for connection pooling. The backend returns the decoded output with
//! the prompt echoed ahead of the continuation; stripping the echo is
//! the caller's job.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::error::ChatError;

/// Trait for prompt-in, text-out generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a continuation for `prompt`.
    ///
    /// The returned text begins with the echoed prompt followed by the
    /// generated continuation.
    async fn generate(&self, prompt: &str) -> crate::Result<String>;
}

/// Fixed sampling policy sent with every request
///
/// `return_full_text` keeps the prompt echo in the output, which the
/// reply-extraction pipeline depends on.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,
    pub no_repeat_ngram_size: u32,
    pub return_full_text: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 150,
            do_sample: true,
            temperature: 0.7,
            top_p: 0.92,
            top_k: 50,
            repetition_penalty: 1.1,
            no_repeat_ngram_size: 3,
            return_full_text: true,
        }
    }
}

/// Reusable inference client (connection-pooled)
pub struct HfInferenceClient {
    client: Client,
    api_token: String,
    endpoint: String,
    config: GenerationConfig,
}

impl HfInferenceClient {
    pub fn new(model_id: &str, api_token: String, api_base: &str) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        let endpoint = format!("{}/models/{}", api_base.trim_end_matches('/'), model_id);
        info!(model = %model_id, endpoint = %endpoint, "Inference client ready");

        Self {
            client,
            api_token,
            endpoint,
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl TextGenerator for HfInferenceClient {
    async fn generate(&self, prompt: &str) -> crate::Result<String> {
        if self.api_token.is_empty() {
            return Err(ChatError::ConfigError(
                "HF_API_TOKEN not configured".to_string(),
            ));
        }

        let request = GenerateRequest {
            inputs: prompt,
            parameters: &self.config,
            options: GenerateOptions {
                wait_for_model: true,
            },
        };

        info!(prompt_chars = prompt.len(), "Calling inference API");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Inference API request failed: {}", e);
                ChatError::InferenceError(format!("Inference API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Inference API error response ({}): {}", status, error_text);
            return Err(ChatError::InferenceError(format!(
                "Inference API error ({}): {}",
                status, error_text
            )));
        }

        let outputs: Vec<GeneratedText> = response.json().await.map_err(|e| {
            error!("Failed to parse inference response: {}", e);
            ChatError::InferenceError(format!("Inference parse error: {}", e))
        })?;

        let output = outputs.into_iter().next().ok_or_else(|| {
            ChatError::InferenceError("Empty response from inference API".to_string())
        })?;

        info!(output_chars = output.generated_text.len(), "Generation complete");

        Ok(output.generated_text)
    }
}

/// Mock generator for development & testing
/// Keeps the chat loop functional without a model backend
pub struct MockGenerator;

const MOCK_CONTINUATION: &str =
    " This is a canned reply produced without a model backend.";

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> crate::Result<String> {
        Ok(format!("{}{}", prompt, MOCK_CONTINUATION))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationConfig,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}
