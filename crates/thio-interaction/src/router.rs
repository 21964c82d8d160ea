//! Response router.
//!
//! Owns the conversation session, decides which backend answers an utterance
//! and turns every provider outcome into a [`ReplyResult`]. Provider errors
//! stop here: they are logged and replaced by a rule-based reply.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thio_core::{
    ChatConfig, ConversationSession, Generation, PersonaDescriptor, ProviderKind, ReplyResult,
    RouterState, RuleBasedResponder, Turn,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::adapter::ProviderSet;

/// A reply together with the provider of the turn that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedReply {
    pub provider: ProviderKind,
    pub reply: ReplyResult,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterError {
    #[error("Cannot change provider while a request is in flight")]
    SelectionLocked,
}

/// Routes utterances to the selected provider, one at a time.
///
/// At most one request is in flight. Utterances that arrive while a request
/// is dispatching, or during the cool-down that follows every reply, are
/// dropped and produce no result.
pub struct ResponseRouter {
    persona: PersonaDescriptor,
    responder: RuleBasedResponder,
    providers: ProviderSet,
    session: Mutex<ConversationSession>,
    cooldown: Duration,
    rng: Mutex<StdRng>,
    reply_sink: Option<UnboundedSender<RoutedReply>>,
}

impl ResponseRouter {
    /// Creates a router for `config`, dispatching remote turns to `providers`.
    pub fn new(config: &ChatConfig, providers: ProviderSet) -> Self {
        Self {
            persona: config.persona.clone(),
            responder: RuleBasedResponder::default(),
            providers,
            session: Mutex::new(ConversationSession::new(config.provider)),
            cooldown: config.cooldown(),
            rng: Mutex::new(StdRng::from_entropy()),
            reply_sink: None,
        }
    }

    pub fn with_responder(mut self, responder: RuleBasedResponder) -> Self {
        self.responder = responder;
        self
    }

    /// Replaces the random source used for rule-based replies.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Also delivers every reply to `sink`, tagged with the turn's provider.
    pub fn with_reply_sink(mut self, sink: UnboundedSender<RoutedReply>) -> Self {
        self.reply_sink = Some(sink);
        self
    }

    pub fn persona(&self) -> &PersonaDescriptor {
        &self.persona
    }

    /// Welcome message for the presentation layer.
    pub fn greeting(&self) -> &str {
        &self.persona.greeting
    }

    pub fn state(&self) -> RouterState {
        self.lock_session().state_at(Instant::now())
    }

    pub fn selected_provider(&self) -> ProviderKind {
        self.lock_session().selected_provider()
    }

    /// Snapshot of the session.
    pub fn session(&self) -> ConversationSession {
        self.lock_session().clone()
    }

    /// Changes the provider used by the next turn.
    ///
    /// Refused while a request is dispatching.
    pub fn select_provider(&self, provider: ProviderKind) -> Result<(), RouterError> {
        let mut session = self.lock_session();
        if !session.select_provider(provider) {
            tracing::debug!("Provider switch to {} refused while dispatching", provider);
            return Err(RouterError::SelectionLocked);
        }
        tracing::info!("Switched to {}", provider.label());
        Ok(())
    }

    /// Submits one utterance.
    ///
    /// Returns `None` without touching the session when the utterance is blank
    /// or the router is busy.
    pub async fn submit_utterance(&self, utterance: &str) -> Option<ReplyResult> {
        let turn = {
            let mut session = self.lock_session();
            session.begin_turn(utterance, &self.persona, Instant::now())
        };

        let Some(turn) = turn else {
            tracing::debug!("Utterance dropped (blank or router busy)");
            return None;
        };
        tracing::debug!(
            provider = %turn.provider,
            framed = turn.prompt != turn.utterance,
            "Turn started"
        );

        let reply = self.dispatch(&turn).await;

        self.lock_session().finish_turn(Instant::now(), self.cooldown);

        if let Some(sink) = &self.reply_sink {
            let routed = RoutedReply {
                provider: turn.provider,
                reply: reply.clone(),
            };
            if sink.send(routed).is_err() {
                tracing::debug!("Reply sink closed");
            }
        }
        Some(reply)
    }

    async fn dispatch(&self, turn: &Turn) -> ReplyResult {
        if !turn.provider.is_remote() {
            return ReplyResult::Text(self.fallback(&turn.utterance));
        }

        let Some(adapter) = self.providers.get(turn.provider) else {
            tracing::warn!(
                "No adapter registered for {}, using local responses",
                turn.provider
            );
            return ReplyResult::Text(self.fallback(&turn.utterance));
        };

        match adapter.generate(&turn.prompt).await {
            Ok(Generation::Text(text)) => {
                tracing::info!("Reply received from {}", turn.provider);
                ReplyResult::Text(text)
            }
            Ok(Generation::RateLimited) => {
                tracing::warn!("{} rate limited the request", turn.provider.label());
                ReplyResult::RateLimited
            }
            Err(err) => {
                tracing::warn!(
                    "{} failed, falling back to local responses: {}",
                    turn.provider,
                    err
                );
                ReplyResult::Text(self.fallback(&turn.utterance))
            }
        }
    }

    fn fallback(&self, utterance: &str) -> String {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.responder.respond_with(utterance, &mut *rng)
    }

    fn lock_session(&self) -> MutexGuard<'_, ConversationSession> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
