pub mod chat;
pub mod models;

use std::sync::Arc;

use thio_core::ChatConfig;
use thio_interaction::{GeminiAdapter, OllamaAdapter, OpenAiAdapter, ProviderSet};

/// Builds every remote adapter from `config`.
///
/// The Ollama adapter is also returned on its own so the REPL can list and
/// switch its models.
pub fn build_providers(config: &ChatConfig) -> (ProviderSet, Arc<OllamaAdapter>) {
    let ollama = Arc::new(OllamaAdapter::from_config(config));
    let providers = ProviderSet::new()
        .with_openai(Arc::new(OpenAiAdapter::from_config(config)))
        .with_gemini(Arc::new(GeminiAdapter::from_config(config)))
        .with_ollama(ollama.clone());
    (providers, ollama)
}

/// Whether an installed model tag is the active model id.
///
/// Ollama lists untagged models as `<name>:latest`, so `llama2` and
/// `llama2:latest` name the same model.
pub fn is_active_model(listed: &str, active: &str) -> bool {
    listed == active
        || listed.strip_suffix(":latest") == Some(active)
        || active.strip_suffix(":latest") == Some(listed)
}
