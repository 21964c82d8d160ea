//! GeminiAdapter - Direct REST API implementation for Gemini generateContent.
//!
//! The API key travels as the `key` query parameter and never appears in
//! error text. A 429 response is a successful [`Generation::RateLimited`]
//! outcome rather than an error, so the router can tell the user to wait
//! instead of silently falling back.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thio_core::config::GeminiSettings;
use thio_core::{
    ChatConfig, Generation, PLACEHOLDER_REPLY, ProviderDescriptor, ProviderError, ProviderKind,
};

use crate::adapter::ProviderAdapter;

/// Adapter that talks to the Gemini HTTP API.
#[derive(Clone, Debug)]
pub struct GeminiAdapter {
    client: Client,
    descriptor: ProviderDescriptor,
    generation_config: GenerationConfig,
}

impl GeminiAdapter {
    /// Creates an adapter for `descriptor` with the default sampling settings.
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self {
            client: Client::new(),
            descriptor,
            generation_config: GenerationConfig::from(&GeminiSettings::default()),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.gemini_descriptor()).with_settings(&config.gemini)
    }

    /// Replaces the sampling settings sent as `generationConfig`.
    pub fn with_settings(mut self, settings: &GeminiSettings) -> Self {
        self.generation_config = GenerationConfig::from(settings);
        self
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: self.generation_config.clone(),
        }
    }

    async fn send_request(
        &self,
        api_key: &str,
        body: &GenerateContentRequest,
    ) -> Result<Generation, ProviderError> {
        let mut request = self
            .client
            .post(&self.descriptor.endpoint)
            .query(&[("key", api_key)]);
        for (name, value) in &self.descriptor.request_headers {
            request = request.header(name, value);
        }

        // The request URL carries the key; errors are rendered without it.
        let response = request.json(body).send().await.map_err(|err| {
            ProviderError::unreachable(format!("Gemini API request failed: {}", err.without_url()))
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Gemini API rate limit hit (429)");
            return Ok(Generation::RateLimited);
        }

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status.as_u16(), body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            ProviderError::invalid_response(format!(
                "Failed to parse Gemini response: {}",
                err.without_url()
            ))
        })?;

        Ok(Generation::Text(extract_text_response(parsed)))
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let api_key = self
            .descriptor
            .credential
            .as_deref()
            .ok_or_else(|| ProviderError::configuration("Gemini API key not configured"))?;

        let request = self.build_request(prompt);
        self.send_request(api_key, &request).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GeminiSettings> for GenerationConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_k: settings.top_k,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Text of the first part of the first candidate.
fn extract_text_response(response: GenerateContentResponse) -> String {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_REPLY.to_string())
}

fn map_http_error(status: u16, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());
    ProviderError::status(status, message)
}
