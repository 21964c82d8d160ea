//! Persona descriptor.
//!
//! The persona is the identity the assistant presents: its name, the system
//! prompt sent on the first turn of a session, and the greeting shown when
//! the widget opens. It is read-only once a session starts.

use serde::{Deserialize, Serialize};

const THIO_SYSTEM_PROMPT: &str = "You are Thio, a friendly and helpful AI voice assistant. You are like a close friend who:
- Is always enthusiastic and supportive
- Has a warm, conversational tone
- Remembers context from the conversation
- Provides helpful and practical advice
- Uses casual, friendly language (not too formal)
- Sometimes uses light humor when appropriate
- Is knowledgeable but not condescending
- Always tries to be genuinely helpful
- Introduces yourself as Thio when first meeting someone
- Acts like a reliable friend who's always there to help

Keep responses conversational and not too long unless specifically asked for detailed information.";

const THIO_GREETING: &str =
    "Hi there! I'm Thio, your AI voice assistant and friend. How can I help you today?";

/// Identity bundle injected into first-turn prompts.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PersonaDescriptor {
    /// Display name, also used as the speaker label in transcript-style prompts
    pub name: String,
    /// Framing sent once per session, ahead of the first utterance
    pub system_prompt: String,
    /// Welcome message shown by the presentation layer
    pub greeting: String,
}

impl PersonaDescriptor {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            greeting: greeting.into(),
        }
    }

    /// Frames a first-turn utterance with the system prompt.
    pub fn frame_first_turn(&self, utterance: &str) -> String {
        format!("{}\n\nUser: {}", self.system_prompt, utterance)
    }
}

impl Default for PersonaDescriptor {
    fn default() -> Self {
        Self::new("Thio", THIO_SYSTEM_PROMPT, THIO_GREETING)
    }
}
