//! Process configuration
//!
//! Two effective knobs: which model to talk to and how many exchanges
//! the memory window keeps. Values come from the environment (loaded
//! via dotenv in the binary) with sensible defaults.

use tracing::warn;

use crate::memory::PromptStyle;

pub const DEFAULT_MODEL: &str = "TinyLlama/TinyLlama-1.1B-Chat-v1.0";
pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_API_BASE: &str = "https://api-inference.huggingface.co";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model identifier, opaque to everything but the inference backend
    /// and the prompt-style detection
    pub model_id: String,
    /// Number of exchanges the memory window retains
    pub window_size: usize,
    /// Inference API token; empty means no backend access
    pub api_token: String,
    /// Inference API base URL
    pub api_base: String,
    /// Strip role-marker substrings from user text before it reaches
    /// the prompt templates (off by default, matching the historical
    /// verbatim behavior)
    pub sanitize: bool,
}

impl ChatConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let model_id =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let window_size = match std::env::var("MEMORY_WINDOW") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    warn!(
                        "MEMORY_WINDOW must be a positive integer, got {:?}; using {}",
                        raw, DEFAULT_WINDOW
                    );
                    DEFAULT_WINDOW
                }
            },
            Err(_) => DEFAULT_WINDOW,
        };

        let api_token = std::env::var("HF_API_TOKEN")
            .or_else(|_| std::env::var("HF_API_KEY"))
            .unwrap_or_default();

        let api_base =
            std::env::var("HF_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let sanitize = std::env::var("CHAT_SANITIZE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            model_id,
            window_size,
            api_token,
            api_base,
            sanitize,
        }
    }

    /// Prompt style implied by the configured model identifier.
    pub fn prompt_style(&self) -> PromptStyle {
        PromptStyle::for_model(&self.model_id)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL.to_string(),
            window_size: DEFAULT_WINDOW,
            api_token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            sanitize: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.model_id, DEFAULT_MODEL);
        assert_eq!(config.window_size, 5);
        assert_eq!(config.prompt_style(), PromptStyle::Chat);
    }

    #[test]
    fn test_prompt_style_follows_model() {
        let config = ChatConfig {
            model_id: "gpt2".to_string(),
            ..ChatConfig::default()
        };
        assert_eq!(config.prompt_style(), PromptStyle::Plain);
    }
}
