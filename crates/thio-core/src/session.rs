//! Conversation session state.
//!
//! A session owns the provider selection, the first-turn flag and the router
//! state machine:
//!
//! ```text
//! idle --utterance--> dispatching --reply--> cooling-down --deadline--> idle
//! ```
//!
//! Cooling-down ends lazily: the session compares its deadline with the
//! caller-supplied `now` instead of running a timer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tokio::time::Instant;
use uuid::Uuid;

use crate::persona::PersonaDescriptor;
use crate::provider::ProviderKind;

/// Externally visible router state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RouterState {
    /// Ready for the next utterance
    Idle,
    /// A reply is being produced
    Dispatching,
    /// Quiet period after a reply; utterances are dropped
    CoolingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Dispatching,
    CoolingDown { until: Instant },
}

/// Work accepted by [`ConversationSession::begin_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Provider snapshot taken when the turn started
    pub provider: ProviderKind,
    /// Outbound prompt, persona-framed on the first turn only
    pub prompt: String,
    /// Trimmed, unframed utterance used for rule-based fallback
    pub utterance: String,
}

/// Mutable per-session state, owned by the router.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    selected_provider: ProviderKind,
    is_first_turn: bool,
    phase: Phase,
}

impl ConversationSession {
    pub fn new(selected_provider: ProviderKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            selected_provider,
            is_first_turn: true,
            phase: Phase::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn selected_provider(&self) -> ProviderKind {
        self.selected_provider
    }

    pub fn is_first_turn(&self) -> bool {
        self.is_first_turn
    }

    /// Router state as of `now`.
    pub fn state_at(&self, now: Instant) -> RouterState {
        match self.phase {
            Phase::Idle => RouterState::Idle,
            Phase::Dispatching => RouterState::Dispatching,
            Phase::CoolingDown { until } if now >= until => RouterState::Idle,
            Phase::CoolingDown { .. } => RouterState::CoolingDown,
        }
    }

    pub fn is_busy_at(&self, now: Instant) -> bool {
        self.state_at(now) != RouterState::Idle
    }

    /// Changes the provider for the next turn.
    ///
    /// Returns `false` and leaves the selection untouched while a turn is
    /// dispatching, so a request never sees its provider change mid-flight.
    pub fn select_provider(&mut self, provider: ProviderKind) -> bool {
        if self.phase == Phase::Dispatching {
            return false;
        }
        self.selected_provider = provider;
        true
    }

    /// Starts a turn for `utterance` if the session is idle.
    ///
    /// Returns `None` for blank utterances and while dispatching or cooling
    /// down; in that case the session is not modified. Building the prompt
    /// clears the first-turn flag even if the provider call later fails.
    pub fn begin_turn(
        &mut self,
        utterance: &str,
        persona: &PersonaDescriptor,
        now: Instant,
    ) -> Option<Turn> {
        let utterance = utterance.trim();
        if utterance.is_empty() || self.is_busy_at(now) {
            return None;
        }

        let prompt = if self.is_first_turn {
            persona.frame_first_turn(utterance)
        } else {
            utterance.to_string()
        };
        self.is_first_turn = false;
        self.phase = Phase::Dispatching;

        Some(Turn {
            provider: self.selected_provider,
            prompt,
            utterance: utterance.to_string(),
        })
    }

    /// Ends the current turn and enters cooling-down until `now + cooldown`.
    pub fn finish_turn(&mut self, now: Instant, cooldown: Duration) {
        self.phase = Phase::CoolingDown {
            until: now + cooldown,
        };
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(ProviderKind::default())
    }
}
