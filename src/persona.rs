//! Assistant persona
//!
//! The persona is the fixed system instruction placed at the head of every
//! completion request.

use serde::{Deserialize, Serialize};

/// Instruction used when no persona is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a smart assistant working for ESHRAQ AI, a company \
specializing in AI solutions for businesses. Your task is to respond to clients and convince them \
to integrate AI systems (like smart chatbots) into their companies to improve performance and \
efficiency. Use simple, clear language and provide practical examples or solutions when needed.";

/// The assistant's role and behavior
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Persona {
    /// Display name, used in logs only
    pub name: String,

    /// System instruction sent as the first message of every request
    pub system_prompt: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "eshraq".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Persona {
    /// Create a persona with a custom instruction
    #[must_use]
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }

    /// Replace the instruction, keeping the name
    ///
    /// Blank overrides are ignored.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        if let Some(prompt) = prompt.filter(|p| !p.trim().is_empty()) {
            self.system_prompt = prompt;
        }
        self
    }
}
