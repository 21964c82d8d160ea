//! Core domain for THIO, the voice chat response router.
//!
//! This crate holds everything that does not touch the network:
//! - `persona`: identity and first-turn framing
//! - `provider`: provider selection, descriptors and adapter outcomes
//! - `session`: per-session state and the idle/dispatching/cooling-down machine
//! - `responder`: rule-based canned replies, the fallback for every provider
//! - `markdown`: reply text to escaped display markup
//! - `config`: `config.toml` loading with environment overrides

pub mod config;
pub mod error;
pub mod markdown;
pub mod persona;
pub mod provider;
pub mod reply;
pub mod responder;
pub mod session;

pub use config::ChatConfig;
pub use error::{ConfigError, ProviderError};
pub use markdown::normalize;
pub use persona::PersonaDescriptor;
pub use provider::{Generation, PLACEHOLDER_REPLY, ProviderDescriptor, ProviderKind};
pub use reply::ReplyResult;
pub use responder::{IntentRule, RuleBasedResponder};
pub use session::{ConversationSession, RouterState, Turn};
