//! OpenAiAdapter - Direct REST API implementation for OpenAI chat completions.
//!
//! Every non-success status, including 429, is a transport error here; only
//! the Gemini adapter reports throttling separately.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thio_core::config::OpenAiSettings;
use thio_core::{
    ChatConfig, Generation, PLACEHOLDER_REPLY, ProviderDescriptor, ProviderError, ProviderKind,
};

use crate::adapter::ProviderAdapter;

/// Adapter that talks to the OpenAI chat completions endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiAdapter {
    client: Client,
    descriptor: ProviderDescriptor,
    model: String,
    max_tokens: u32,
    temperature: f32,
    system_prompt: Option<String>,
}

impl OpenAiAdapter {
    /// Creates an adapter for `descriptor` with the default request settings.
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        let defaults = OpenAiSettings::default();
        Self {
            client: Client::new(),
            descriptor,
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            system_prompt: defaults.system_prompt,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        let settings = &config.openai;
        let adapter = Self::new(config.openai_descriptor())
            .with_model(&settings.model)
            .with_max_tokens(settings.max_tokens)
            .with_temperature(settings.temperature);
        match &settings.system_prompt {
            Some(prompt) => adapter.with_system_prompt(prompt),
            None => adapter,
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Adds a system message that will be sent ahead of every prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn send_request(
        &self,
        api_key: &str,
        body: &ChatCompletionRequest,
    ) -> Result<Generation, ProviderError> {
        let mut request = self
            .client
            .post(&self.descriptor.endpoint)
            .header("Authorization", format!("Bearer {}", api_key));
        for (name, value) in &self.descriptor.request_headers {
            request = request.header(name, value);
        }

        let response = request.json(body).send().await.map_err(|err| {
            ProviderError::unreachable(format!("OpenAI API request failed: {err}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status.as_u16(), body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            ProviderError::invalid_response(format!("Failed to parse OpenAI response: {err}"))
        })?;

        Ok(Generation::Text(extract_text_response(parsed)))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let api_key = self
            .descriptor
            .credential
            .as_deref()
            .ok_or_else(|| ProviderError::configuration("OpenAI API key not configured"))?;

        let request = self.build_request(prompt);
        self.send_request(api_key, &request).await
    }
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_REPLY.to_string())
}

fn map_http_error(status: u16, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    ProviderError::status(status, message)
}
