//! Provider selection and per-backend descriptors.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Placeholder returned when a provider answers without an extractable completion.
pub const PLACEHOLDER_REPLY: &str = "I'm having trouble generating a response right now.";

/// Backend that produces the reply for the current session.
#[derive(
    Deserialize,
    Serialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    /// Nothing selected; replies come from the rule-based responder
    None,
    /// Rule-based responder only
    #[default]
    Local,
    /// OpenAI chat completions
    OpenAi,
    /// Google Gemini generateContent
    Gemini,
    /// Ollama daemon on the local machine
    Ollama,
}

impl ProviderKind {
    /// Whether this selection dispatches to a remote adapter.
    pub fn is_remote(self) -> bool {
        matches!(self, Self::OpenAi | Self::Gemini | Self::Ollama)
    }

    /// Human-facing label used in switch and throttling notices.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "no provider",
            Self::Local => "local responses",
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Google",
            Self::Ollama => "Ollama",
        }
    }
}

/// Outcome of a successful adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Completion text, or [`PLACEHOLDER_REPLY`] when the envelope had none
    Text(String),
    /// The provider throttled the request
    RateLimited,
}

/// Immutable wiring for one remote backend.
///
/// An absent credential is a valid state meaning "not configured"; the
/// adapter reports it as a configuration error at call time.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub provider_id: ProviderKind,
    pub endpoint: String,
    pub credential: Option<String>,
    pub request_headers: BTreeMap<String, String>,
}

impl ProviderDescriptor {
    pub fn new(provider_id: ProviderKind, endpoint: impl Into<String>) -> Self {
        let mut request_headers = BTreeMap::new();
        request_headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            provider_id,
            endpoint: endpoint.into(),
            credential: None,
            request_headers,
        }
    }

    /// Sets the credential; blank strings are treated as absent.
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("provider_id", &self.provider_id)
            .field("endpoint", &self.endpoint)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<redacted>"),
            )
            .field("request_headers", &self.request_headers)
            .finish()
    }
}
