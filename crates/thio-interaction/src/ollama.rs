//! OllamaAdapter - REST client for a locally running Ollama daemon.
//!
//! Ollama needs no credential. The endpoint is the daemon base URL and the
//! adapter appends `/api/generate` and `/api/tags` itself.

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thio_core::{
    ChatConfig, Generation, PLACEHOLDER_REPLY, ProviderDescriptor, ProviderError, ProviderKind,
};

use crate::adapter::ProviderAdapter;

const DEFAULT_OLLAMA_MODEL: &str = "llama2";
const DEFAULT_SPEAKER: &str = "Thio";

const CONNECT_HINT: &str = "Failed to connect to Ollama. Make sure Ollama is running locally. \
     You can download it from https://ollama.ai";

/// Adapter that talks to the Ollama generate API.
#[derive(Debug)]
pub struct OllamaAdapter {
    client: Client,
    descriptor: ProviderDescriptor,
    model: RwLock<String>,
    speaker: String,
}

impl OllamaAdapter {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self {
            client: Client::new(),
            descriptor,
            model: RwLock::new(DEFAULT_OLLAMA_MODEL.to_string()),
            speaker: DEFAULT_SPEAKER.to_string(),
        }
    }

    /// Builds the adapter from the `[ollama]` section, speaking as the configured persona.
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.ollama_descriptor())
            .with_model(&config.ollama.model)
            .with_speaker(&config.persona.name)
    }

    pub fn with_model(self, model: impl Into<String>) -> Self {
        self.set_model(model);
        self
    }

    /// Name used for the reply cue and stripped from the start of replies.
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = speaker.into();
        self
    }

    /// Currently selected model id.
    pub fn model(&self) -> String {
        match self.model.read() {
            Ok(model) => model.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Switches the model used by subsequent requests.
    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        tracing::info!("Ollama model set to {}", model);
        match self.model.write() {
            Ok(mut current) => *current = model,
            Err(poisoned) => *poisoned.into_inner() = model,
        }
    }

    /// Lists the models installed on the daemon.
    ///
    /// Any failure yields an empty list.
    pub async fn list_available_models(&self) -> Vec<String> {
        match self.fetch_models().await {
            Ok(models) => models,
            Err(err) => {
                tracing::warn!("Failed to fetch Ollama models: {}", err);
                Vec::new()
            }
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(self.url("api/tags"))
            .send()
            .await
            .map_err(|err| ProviderError::unreachable(format!("{CONNECT_HINT} ({err})")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::status(
                status.as_u16(),
                format!("Ollama API error: {status}"),
            ));
        }

        let tags: TagsResponse = response.json().await.map_err(|err| {
            ProviderError::invalid_response(format!("Failed to parse Ollama tags: {err}"))
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.descriptor.endpoint.trim_end_matches('/'), path)
    }

    fn build_request(&self, model: String, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model,
            prompt: format!("User: {}\n{}:", prompt, self.speaker),
            stream: false,
        }
    }

    fn clean_reply(&self, raw: &str) -> String {
        let trimmed = raw.trim_start();
        let without_speaker = trimmed
            .strip_prefix(self.speaker.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(trimmed);
        without_speaker.trim().to_string()
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        if self.descriptor.endpoint.trim().is_empty() {
            return Err(ProviderError::configuration("Ollama base URL not configured"));
        }
        let model = self.model();
        if model.trim().is_empty() {
            return Err(ProviderError::configuration("Ollama model not configured"));
        }

        let body = self.build_request(model, prompt);
        let mut request = self.client.post(self.url("api/generate"));
        for (name, value) in &self.descriptor.request_headers {
            request = request.header(name, value);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::unreachable(format!("{CONNECT_HINT} ({err})")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::status(
                status.as_u16(),
                format!("Ollama API error: {status}"),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|err| {
            ProviderError::invalid_response(format!("Failed to parse Ollama response: {err}"))
        })?;

        let text = parsed
            .response
            .map(|raw| self.clean_reply(&raw))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_REPLY.to_string());
        Ok(Generation::Text(text))
    }
}

#[derive(Serialize, Debug)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}
