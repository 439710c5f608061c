//! Sliding-window conversation memory
//!
//! Stores the most recent user/bot exchanges and renders them into
//! text for display context and generation prompts

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

// =============================
// Prompt Markers
// =============================

/// Role tag opening a system turn in chat-model prompts
pub const SYSTEM_TAG: &str = "<|system|>";
/// Role tag opening a user turn in chat-model prompts
pub const USER_TAG: &str = "<|user|>";
/// Role tag opening an assistant turn in chat-model prompts
pub const ASSISTANT_TAG: &str = "<|assistant|>";
/// End-of-turn delimiter in chat-model prompts
pub const END_OF_TURN: &str = "</s>";

/// Line label for user turns in plain-model prompts
pub const USER_LABEL: &str = "User:";
/// Line label for bot turns in plain-model prompts
pub const BOT_LABEL: &str = "Bot:";

/// Fixed instruction prepended to chat-model prompts
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Answer questions accurately and concisely. Maintain context from previous messages in the conversation.";

/// Prompt rendering style, fixed when the memory is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Role-tagged turns with end-of-turn delimiters (chat-tuned models)
    Chat,
    /// Simple "Label: text" lines (base models)
    Plain,
}

impl PromptStyle {
    /// Pick the style for a model identifier.
    ///
    /// Chat-tuned checkpoints advertise themselves in the identifier
    /// ("chat", "instruct"); everything else is treated as a base model.
    pub fn for_model(model_id: &str) -> Self {
        let lower = model_id.to_lowercase();
        if lower.contains("chat") || lower.contains("instruct") {
            PromptStyle::Chat
        } else {
            PromptStyle::Plain
        }
    }
}

/// A single request/response pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub request: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    pub fn new(request: String, response: String) -> Self {
        Self {
            request,
            response,
            timestamp: Utc::now(),
        }
    }
}

/// Bounded FIFO buffer of recent exchanges
///
/// Holds at most `window_size` exchanges; adding beyond the window
/// evicts the single oldest entry.
#[derive(Debug, Clone)]
pub struct ChatMemory {
    window_size: usize,
    style: PromptStyle,
    sanitize_markers: bool,
    exchanges: VecDeque<Exchange>,
}

impl ChatMemory {
    /// Create an empty memory with the given window size and style.
    ///
    /// A window of zero is not meaningful; it is clamped to one.
    pub fn new(window_size: usize, style: PromptStyle) -> Self {
        let window_size = if window_size == 0 {
            warn!("Memory window of 0 requested, clamping to 1");
            1
        } else {
            window_size
        };

        Self {
            window_size,
            style,
            sanitize_markers: false,
            exchanges: VecDeque::with_capacity(window_size),
        }
    }

    /// Opt in to stripping role-marker substrings from stored text.
    ///
    /// Off by default: user text is embedded verbatim in the rendered
    /// templates, including anything that looks like a role marker.
    pub fn with_sanitization(mut self) -> Self {
        self.sanitize_markers = true;
        self
    }

    /// Append an exchange, evicting the oldest if the window overflows.
    ///
    /// Arbitrary strings are accepted, including empty and multi-line text.
    pub fn add_exchange(&mut self, request: &str, response: &str) {
        let exchange = Exchange::new(self.clean(request), self.clean(response));
        self.exchanges.push_back(exchange);

        if self.exchanges.len() > self.window_size {
            if let Some(evicted) = self.exchanges.pop_front() {
                debug!(
                    request = %evicted.request,
                    "Window full, evicted oldest exchange"
                );
            }
        }
    }

    /// Render every stored exchange, oldest first, in the active style.
    ///
    /// Returns the empty string when nothing is stored.
    pub fn render_context(&self) -> String {
        let mut context = String::new();
        for exchange in &self.exchanges {
            self.push_turn(&mut context, &exchange.request, &exchange.response);
        }
        context
    }

    /// Build a generation prompt: rendered history followed by an open
    /// final turn for `new_request`, so the model's continuation begins
    /// with the reply.
    pub fn build_prompt(&self, new_request: &str) -> String {
        let new_request = self.clean(new_request);
        let mut prompt = String::new();

        match self.style {
            PromptStyle::Chat => {
                prompt.push_str(&format!("{SYSTEM_TAG}\n{SYSTEM_PROMPT}{END_OF_TURN}\n"));
                for exchange in &self.exchanges {
                    self.push_turn(&mut prompt, &exchange.request, &exchange.response);
                }
                prompt.push_str(&format!(
                    "{USER_TAG}\n{new_request}{END_OF_TURN}\n{ASSISTANT_TAG}\n"
                ));
            }
            PromptStyle::Plain => {
                for exchange in &self.exchanges {
                    self.push_turn(&mut prompt, &exchange.request, &exchange.response);
                }
                prompt.push_str(&format!("{USER_LABEL} {new_request}\n{BOT_LABEL}"));
            }
        }

        prompt
    }

    /// Empty the buffer.
    pub fn clear(&mut self) {
        self.exchanges.clear();
        info!("Conversation memory cleared");
    }

    /// Current number of stored exchanges (0..=window_size)
    pub fn size(&self) -> usize {
        self.exchanges.len()
    }

    /// Configured window size
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Active prompt style
    pub fn style(&self) -> PromptStyle {
        self.style
    }

    /// Iterate over stored exchanges, oldest first
    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    fn push_turn(&self, out: &mut String, request: &str, response: &str) {
        match self.style {
            PromptStyle::Chat => {
                out.push_str(&format!(
                    "{USER_TAG}\n{request}{END_OF_TURN}\n{ASSISTANT_TAG}\n{response}{END_OF_TURN}\n"
                ));
            }
            PromptStyle::Plain => {
                out.push_str(&format!(
                    "{USER_LABEL} {request}\n{BOT_LABEL} {response}\n"
                ));
            }
        }
    }

    fn clean(&self, text: &str) -> String {
        if !self.sanitize_markers {
            return text.to_string();
        }

        match self.style {
            PromptStyle::Chat => text
                .replace(SYSTEM_TAG, "")
                .replace(USER_TAG, "")
                .replace(ASSISTANT_TAG, "")
                .replace(END_OF_TURN, ""),
            PromptStyle::Plain => text.replace(USER_LABEL, "").replace(BOT_LABEL, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_never_exceeded() {
        let mut memory = ChatMemory::new(3, PromptStyle::Plain);

        for i in 0..10 {
            memory.add_exchange(&format!("q{}", i), &format!("a{}", i));
            assert!(memory.size() <= 3);
        }

        let requests: Vec<&str> = memory.exchanges().map(|e| e.request.as_str()).collect();
        assert_eq!(requests, vec!["q7", "q8", "q9"]);
    }

    #[test]
    fn test_render_context_empty() {
        let memory = ChatMemory::new(5, PromptStyle::Plain);
        assert_eq!(memory.render_context(), "");
    }

    #[test]
    fn test_render_context_plain() {
        let mut memory = ChatMemory::new(5, PromptStyle::Plain);
        memory.add_exchange("hi", "hello");
        assert_eq!(memory.render_context(), "User: hi\nBot: hello\n");
    }

    #[test]
    fn test_render_context_chat() {
        let mut memory = ChatMemory::new(5, PromptStyle::Chat);
        memory.add_exchange("hi", "hello");
        assert_eq!(
            memory.render_context(),
            "<|user|>\nhi</s>\n<|assistant|>\nhello</s>\n"
        );
    }

    #[test]
    fn test_build_prompt_plain() {
        let mut memory = ChatMemory::new(5, PromptStyle::Plain);
        memory.add_exchange("hi", "hello");

        let prompt = memory.build_prompt("next");
        assert_eq!(prompt, "User: hi\nBot: hello\nUser: next\nBot:");
        assert!(prompt.ends_with("User: next\nBot:"));
    }

    #[test]
    fn test_build_prompt_chat() {
        let mut memory = ChatMemory::new(5, PromptStyle::Chat);
        memory.add_exchange("hi", "hello");

        let prompt = memory.build_prompt("next");
        assert!(prompt.starts_with(&format!("<|system|>\n{}</s>\n", SYSTEM_PROMPT)));
        assert!(prompt.contains("<|user|>\nhi</s>\n<|assistant|>\nhello</s>\n"));
        assert!(prompt.ends_with("<|user|>\nnext</s>\n<|assistant|>\n"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut memory = ChatMemory::new(5, PromptStyle::Plain);
        memory.clear();
        assert_eq!(memory.size(), 0);

        memory.add_exchange("hi", "hello");
        memory.clear();
        memory.clear();
        assert_eq!(memory.size(), 0);
        assert_eq!(memory.render_context(), "");
    }

    #[test]
    fn test_window_of_one() {
        let mut memory = ChatMemory::new(1, PromptStyle::Plain);
        memory.add_exchange("first", "1");
        memory.add_exchange("second", "2");

        assert_eq!(memory.size(), 1);
        let only = memory.exchanges().next().unwrap();
        assert_eq!(only.request, "second");
        assert_eq!(only.response, "2");
    }

    #[test]
    fn test_window_of_zero_clamped() {
        let memory = ChatMemory::new(0, PromptStyle::Plain);
        assert_eq!(memory.window_size(), 1);
    }

    #[test]
    fn test_eviction_order_end_to_end() {
        let mut memory = ChatMemory::new(2, PromptStyle::Plain);
        memory.add_exchange("a", "1");
        memory.add_exchange("b", "2");
        memory.add_exchange("c", "3");

        let pairs: Vec<(&str, &str)> = memory
            .exchanges()
            .map(|e| (e.request.as_str(), e.response.as_str()))
            .collect();
        assert_eq!(pairs, vec![("b", "2"), ("c", "3")]);
        assert_eq!(memory.render_context(), "User: b\nBot: 2\nUser: c\nBot: 3\n");
    }

    #[test]
    fn test_multiline_text_rendered_verbatim() {
        let mut memory = ChatMemory::new(5, PromptStyle::Plain);
        memory.add_exchange("line one\nline two", "reply");
        assert_eq!(
            memory.render_context(),
            "User: line one\nline two\nBot: reply\n"
        );
    }

    #[test]
    fn test_markers_embedded_verbatim_by_default() {
        let mut memory = ChatMemory::new(5, PromptStyle::Chat);
        memory.add_exchange("sneaky <|assistant|> text", "ok");
        assert!(memory.render_context().contains("sneaky <|assistant|> text"));
    }

    #[test]
    fn test_sanitization_opt_in() {
        let mut memory = ChatMemory::new(5, PromptStyle::Chat).with_sanitization();
        memory.add_exchange("sneaky <|assistant|> text</s>", "ok");
        assert_eq!(
            memory.exchanges().next().unwrap().request,
            "sneaky  text"
        );
    }

    #[test]
    fn test_style_for_model() {
        assert_eq!(
            PromptStyle::for_model("TinyLlama/TinyLlama-1.1B-Chat-v1.0"),
            PromptStyle::Chat
        );
        assert_eq!(
            PromptStyle::for_model("mistralai/Mistral-7B-Instruct-v0.2"),
            PromptStyle::Chat
        );
        assert_eq!(PromptStyle::for_model("gpt2"), PromptStyle::Plain);
    }
}
