//! Configuration file management for THIO.
//!
//! Reads `config.toml` from the platform config directory
//! (e.g. `~/.config/thio/config.toml`), then applies environment overrides.
//! Every field has a default, so a missing file yields a local-only setup.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::persona::PersonaDescriptor;
use crate::provider::{ProviderDescriptor, ProviderKind};

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const PROVIDER_ENV: &str = "THIO_PROVIDER";

const DEFAULT_COOLDOWN_MS: u64 = 2500;

/// Root configuration structure for config.toml
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Provider selected when a session starts
    pub provider: ProviderKind,
    /// Quiet period after each reply, in milliseconds
    pub cooldown_ms: u64,
    pub persona: PersonaDescriptor,
    pub openai: OpenAiSettings,
    pub gemini: GeminiSettings,
    pub ollama: OllamaSettings,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            persona: PersonaDescriptor::default(),
            openai: OpenAiSettings::default(),
            gemini: GeminiSettings::default(),
            ollama: OllamaSettings::default(),
        }
    }
}

/// OpenAI chat completions settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OpenAiSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Sent as a `system` message on every request when set
    pub system_prompt: Option<String>,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            temperature: 0.7,
            system_prompt: None,
        }
    }
}

/// Gemini generateContent settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeminiSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint:
                "https://generativelanguage.googleapis.com/v1/models/gemini-1.5-flash:generateContent"
                    .to_string(),
            api_key: None,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 150,
        }
    }
}

/// Local Ollama daemon settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
        }
    }
}

impl ChatConfig {
    /// Returns the default config path: `<config dir>/thio/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("thio").join("config.toml"))
    }

    /// Loads the config file at `path`.
    ///
    /// A missing or blank file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from `path` (or the default location) and applies the process environment.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load(&Self::default_path()?)?,
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(OPENAI_API_KEY_ENV) {
            self.openai.api_key = Some(key);
        }
        if let Some(key) = get(GEMINI_API_KEY_ENV) {
            self.gemini.api_key = Some(key);
        }
        if let Some(host) = get(OLLAMA_HOST_ENV) {
            self.ollama.base_url = host;
        }
        if let Some(name) = get(PROVIDER_ENV) {
            self.provider = parse_provider(&name)?;
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn openai_descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(ProviderKind::OpenAi, &self.openai.endpoint)
            .with_credential(self.openai.api_key.clone())
    }

    pub fn gemini_descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(ProviderKind::Gemini, &self.gemini.endpoint)
            .with_credential(self.gemini.api_key.clone())
    }

    /// The Ollama endpoint is the daemon base URL; it needs no credential.
    pub fn ollama_descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(ProviderKind::Ollama, &self.ollama.base_url)
    }

    /// One descriptor per remote backend.
    pub fn provider_descriptors(&self) -> Vec<ProviderDescriptor> {
        vec![
            self.openai_descriptor(),
            self.gemini_descriptor(),
            self.ollama_descriptor(),
        ]
    }
}

/// Parses a provider name such as `gemini` or `OpenAI`.
pub fn parse_provider(name: &str) -> Result<ProviderKind, ConfigError> {
    ProviderKind::from_str(name.trim())
        .map_err(|_| ConfigError::UnknownProvider(name.trim().to_string()))
}
