//! Provider adapters and the response router for THIO.
//!
//! - `adapter`: the `ProviderAdapter` trait and the closed `ProviderSet`
//! - `openai`, `gemini`, `ollama`: HTTP adapters for each remote backend
//! - `router`: the `ResponseRouter` state machine with rule-based fallback

pub mod adapter;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod router;

pub use adapter::{ProviderAdapter, ProviderSet};
pub use gemini::GeminiAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use router::{ResponseRouter, RoutedReply, RouterError};
