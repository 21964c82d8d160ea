//! Uniform provider adapter interface.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thio_core::{Generation, ProviderError, ProviderKind};

/// One remote completion backend behind a `(prompt) -> reply` call.
///
/// Implementations issue exactly one request per call and never retry.
/// Missing credentials are reported as [`ProviderError::Configuration`]
/// before any network I/O; throttling is reported as
/// [`Generation::RateLimited`] by the providers that distinguish it.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Backend this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Produces a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError>;
}

/// The closed set of remote adapters, one slot per [`ProviderKind`].
#[derive(Clone, Default)]
pub struct ProviderSet {
    openai: Option<Arc<dyn ProviderAdapter>>,
    gemini: Option<Arc<dyn ProviderAdapter>>,
    ollama: Option<Arc<dyn ProviderAdapter>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_openai(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.openai = Some(adapter);
        self
    }

    pub fn with_gemini(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.gemini = Some(adapter);
        self
    }

    pub fn with_ollama(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.ollama = Some(adapter);
        self
    }

    /// Adapter for `kind`. Local and none selections have no adapter.
    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn ProviderAdapter>> {
        match kind {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::Ollama => self.ollama.as_ref(),
            ProviderKind::Local | ProviderKind::None => None,
        }
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field("openai", &self.openai.is_some())
            .field("gemini", &self.gemini.is_some())
            .field("ollama", &self.ollama.is_some())
            .finish()
    }
}
