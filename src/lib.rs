//! Contextual Chatbot
//!
//! A command-line conversational assistant that:
//! - Wraps a pretrained causal language model behind a read-eval-print loop
//! - Keeps a bounded sliding window of recent exchanges for context
//! - Renders history as chat-style role tags or plain labelled lines
//! - Cleans raw model output through an ordered extraction pipeline
//!
//! LOOP:
//! READ → BUILD PROMPT → GENERATE → EXTRACT REPLY → REMEMBER → PRINT

pub mod config;
pub mod error;
pub mod inference;
pub mod memory;
pub mod postprocess;
pub mod session;

pub use error::Result;

// Re-export common types
pub use config::ChatConfig;
pub use memory::{ChatMemory, Exchange, PromptStyle};
pub use session::{ChatSession, Command};
