//! Reply results delivered to the presentation layer.

use serde::{Deserialize, Serialize};

/// Tagged outcome of one routed utterance.
///
/// Throttling is its own variant, so no reply text can ever be mistaken for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ReplyResult {
    /// Displayable reply text (provider output or rule-based fallback)
    Text(String),
    /// The provider throttled the request; show a "slow down" notice instead
    RateLimited,
}

impl ReplyResult {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::RateLimited => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}
