//! Interactive chat session
//!
//! Orchestrates the read-eval-print loop: reads user input, dispatches
//! commands, builds prompts from memory, calls the generator, and feeds
//! each cleaned reply back into memory. One turn at a time; generation
//! blocks the loop until the backend answers.

use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::inference::TextGenerator;
use crate::memory::ChatMemory;
use crate::postprocess;

const FAREWELL: &str = "Exiting chatbot. Goodbye!";

/// Session commands, recognized by a leading '/'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    Memory,
    Unknown,
}

impl Command {
    /// Parse a line as a command.
    ///
    /// Returns None unless the trimmed line starts with the sigil;
    /// matching is case-insensitive. Anything sigil-prefixed but
    /// unrecognized is `Unknown`, which the session ignores.
    pub fn parse(input: &str) -> Option<Command> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return None;
        }

        match trimmed.to_lowercase().as_str() {
            "/exit" => Some(Command::Exit),
            "/clear" => Some(Command::Clear),
            "/memory" => Some(Command::Memory),
            _ => Some(Command::Unknown),
        }
    }
}

/// One interactive session: exclusively owns the memory and the generator.
pub struct ChatSession {
    session_id: Uuid,
    memory: ChatMemory,
    generator: Box<dyn TextGenerator>,
}

impl ChatSession {
    pub fn new(config: &ChatConfig, generator: Box<dyn TextGenerator>) -> Self {
        let memory = ChatMemory::new(config.window_size, config.prompt_style());
        let memory = if config.sanitize {
            memory.with_sanitization()
        } else {
            memory
        };

        Self {
            session_id: Uuid::new_v4(),
            memory,
            generator,
        }
    }

    /// Run the conversation loop until `/exit`, end of input, Ctrl-C,
    /// or an inference failure.
    pub async fn run(&mut self) -> crate::Result<()> {
        info!(
            session_id = %self.session_id,
            window = self.memory.window_size(),
            style = ?self.memory.style(),
            "Chat session starting"
        );

        self.print_banner();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("User: ");
            std::io::stdout().flush()?;

            let line = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("\n\n{}", FAREWELL);
                    return Ok(());
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                // stdin closed
                println!("\n{}", FAREWELL);
                return Ok(());
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if let Some(command) = Command::parse(input) {
                if self.dispatch(command) {
                    return Ok(());
                }
                continue;
            }

            let reply = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("\n\n{}", FAREWELL);
                    return Ok(());
                }
                reply = self.take_turn(input) => reply?,
            };

            println!("Bot: {}", reply);
            println!();
        }
    }

    /// Execute one conversational turn: prompt, generate, clean, remember.
    ///
    /// Memory is only updated once the reply is fully extracted, so a
    /// failed turn leaves no trace.
    pub async fn take_turn(&mut self, input: &str) -> crate::Result<String> {
        let prompt = self.memory.build_prompt(input);
        let raw = self.generator.generate(&prompt).await?;
        let reply = postprocess::extract_reply(&raw, &prompt, self.memory.style());
        self.memory.add_exchange(input, &reply);

        Ok(reply)
    }

    /// Handle a command; returns true when the session should end.
    fn dispatch(&mut self, command: Command) -> bool {
        match command {
            Command::Exit => {
                println!("\n{}", FAREWELL);
                true
            }
            Command::Clear => {
                self.memory.clear();
                println!("Memory cleared.\n");
                false
            }
            Command::Memory => {
                println!("{}\n", self.memory_report());
                false
            }
            Command::Unknown => false,
        }
    }

    fn memory_report(&self) -> String {
        format!(
            "Memory: {}/{} exchanges stored",
            self.memory.size(),
            self.memory.window_size()
        )
    }

    fn print_banner(&self) {
        let rule = "=".repeat(60);
        println!("{}", rule);
        println!("Welcome to the Chatbot!");
        println!("{}", rule);
        println!("Commands:");
        println!("  /exit    - Exit the chatbot");
        println!("  /clear   - Clear conversation memory");
        println!("  /memory  - Show current memory usage");
        println!("{}", rule);
        println!();
    }

    pub fn memory(&self) -> &ChatMemory {
        &self.memory
    }
}
