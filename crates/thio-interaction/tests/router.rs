//! Router behaviour against in-memory fake adapters.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thio_core::{
    ChatConfig, Generation, PersonaDescriptor, ProviderError, ProviderKind, ReplyResult,
    RouterState, RuleBasedResponder,
};
use thio_interaction::{ProviderAdapter, ProviderSet, ResponseRouter, RoutedReply, RouterError};
use tokio::sync::{Notify, mpsc};

const SEED: u64 = 11;
const SYSTEM_PROMPT: &str = "You are Testy, a patient assistant.";

/// Fake adapter with a scripted outcome that records every prompt.
struct FakeAdapter {
    kind: ProviderKind,
    outcome: Result<Generation, ProviderError>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Gate>,
}

/// Holds a request in flight until released.
struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl FakeAdapter {
    fn new(kind: ProviderKind, outcome: Result<Generation, ProviderError>) -> Self {
        Self {
            kind,
            outcome,
            prompts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn replying(kind: ProviderKind, text: &str) -> Self {
        Self::new(kind, Ok(Generation::Text(text.to_string())))
    }

    fn gated(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some(Gate { entered, release });
        self
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.outcome.clone()
    }
}

fn config(provider: ProviderKind) -> ChatConfig {
    ChatConfig {
        provider,
        persona: PersonaDescriptor::new("Testy", SYSTEM_PROMPT, "Welcome!"),
        ..ChatConfig::default()
    }
}

fn router_with(provider: ProviderKind, providers: ProviderSet) -> ResponseRouter {
    ResponseRouter::new(&config(provider), providers)
        .with_rng(StdRng::seed_from_u64(SEED))
        .with_cooldown(Duration::ZERO)
}

fn expected_local(utterance: &str) -> ReplyResult {
    ReplyResult::Text(
        RuleBasedResponder::default().respond_with(utterance, &mut StdRng::seed_from_u64(SEED)),
    )
}

#[tokio::test]
async fn test_successful_reply_passes_through() {
    let adapter = Arc::new(FakeAdapter::replying(ProviderKind::OpenAi, "From the cloud"));
    let router = router_with(
        ProviderKind::OpenAi,
        ProviderSet::new().with_openai(adapter.clone()),
    );

    assert_eq!(
        router.submit_utterance("hello").await,
        Some(ReplyResult::text("From the cloud"))
    );
}

#[tokio::test]
async fn test_configuration_error_equals_local_reply() {
    let adapter = Arc::new(FakeAdapter::new(
        ProviderKind::Gemini,
        Err(ProviderError::configuration("Gemini API key not configured")),
    ));
    let router = router_with(
        ProviderKind::Gemini,
        ProviderSet::new().with_gemini(adapter.clone()),
    );

    let reply = router.submit_utterance("  what can you do?  ").await;
    assert_eq!(reply, Some(expected_local("what can you do?")));
    // The adapter saw the framed prompt, the fallback used the bare utterance
    assert!(adapter.prompts()[0].starts_with(SYSTEM_PROMPT));
}

#[tokio::test]
async fn test_transport_error_falls_back() {
    let adapter = Arc::new(FakeAdapter::new(
        ProviderKind::Ollama,
        Err(ProviderError::unreachable("Failed to connect to Ollama")),
    ));
    let router = router_with(
        ProviderKind::Ollama,
        ProviderSet::new().with_ollama(adapter),
    );

    assert_eq!(
        router.submit_utterance("quantum flux").await,
        Some(expected_local("quantum flux"))
    );
}

#[tokio::test]
async fn test_rate_limit_surfaces_without_fallback() {
    let adapter = Arc::new(FakeAdapter::new(
        ProviderKind::Gemini,
        Ok(Generation::RateLimited),
    ));
    let router = router_with(
        ProviderKind::Gemini,
        ProviderSet::new().with_gemini(adapter),
    );

    let reply = router.submit_utterance("hello").await.unwrap();
    assert!(reply.is_rate_limited());
    assert_eq!(reply.as_text(), None);
}

#[tokio::test]
async fn test_persona_framing_sent_once() {
    let adapter = Arc::new(FakeAdapter::replying(ProviderKind::OpenAi, "ok"));
    let router = router_with(
        ProviderKind::OpenAi,
        ProviderSet::new().with_openai(adapter.clone()),
    );

    router.submit_utterance("first question").await.unwrap();
    router.submit_utterance("second question").await.unwrap();

    let prompts = adapter.prompts();
    assert_eq!(
        prompts[0],
        format!("{}\n\nUser: first question", SYSTEM_PROMPT)
    );
    assert_eq!(prompts[0].matches(SYSTEM_PROMPT).count(), 1);
    assert_eq!(prompts[1], "second question");
}

#[tokio::test]
async fn test_first_turn_flag_cleared_even_when_provider_fails() {
    let adapter = Arc::new(FakeAdapter::new(
        ProviderKind::OpenAi,
        Err(ProviderError::status(500, "boom")),
    ));
    let router = router_with(
        ProviderKind::OpenAi,
        ProviderSet::new().with_openai(adapter.clone()),
    );

    router.submit_utterance("one").await.unwrap();
    router.submit_utterance("two").await.unwrap();

    assert!(!router.session().is_first_turn());
    assert_eq!(adapter.prompts()[1], "two");
}

#[tokio::test]
async fn test_local_turns_consume_first_turn_framing() {
    let adapter = Arc::new(FakeAdapter::replying(ProviderKind::OpenAi, "ok"));
    let router = router_with(
        ProviderKind::Local,
        ProviderSet::new().with_openai(adapter.clone()),
    );

    router.submit_utterance("hi").await.unwrap();
    router.select_provider(ProviderKind::OpenAi).unwrap();
    router.submit_utterance("now remote").await.unwrap();

    assert_eq!(adapter.prompts(), vec!["now remote".to_string()]);
}

#[tokio::test]
async fn test_blank_utterance_is_ignored() {
    let router = router_with(ProviderKind::Local, ProviderSet::new());

    assert_eq!(router.submit_utterance("").await, None);
    assert_eq!(router.submit_utterance("   \n\t").await, None);
    assert_eq!(router.state(), RouterState::Idle);
    assert!(router.session().is_first_turn());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_utterance_while_dispatching_is_dropped() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let adapter = Arc::new(
        FakeAdapter::replying(ProviderKind::OpenAi, "slow reply")
            .gated(entered.clone(), release.clone()),
    );
    let router = Arc::new(router_with(
        ProviderKind::OpenAi,
        ProviderSet::new().with_openai(adapter.clone()),
    ));

    let in_flight = {
        let router = Arc::clone(&router);
        tokio::spawn(async move { router.submit_utterance("first").await })
    };
    entered.notified().await;

    assert_eq!(router.state(), RouterState::Dispatching);
    let before = router.session();
    assert_eq!(router.submit_utterance("second").await, None);
    let after = router.session();
    assert_eq!(before.is_first_turn(), after.is_first_turn());
    assert_eq!(before.selected_provider(), after.selected_provider());

    release.notify_one();
    assert_eq!(
        in_flight.await.unwrap(),
        Some(ReplyResult::text("slow reply"))
    );
    assert_eq!(adapter.prompts().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_selection_locked_while_dispatching() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let adapter = Arc::new(
        FakeAdapter::replying(ProviderKind::Gemini, "done").gated(entered.clone(), release.clone()),
    );
    let router = Arc::new(router_with(
        ProviderKind::Gemini,
        ProviderSet::new().with_gemini(adapter),
    ));

    let in_flight = {
        let router = Arc::clone(&router);
        tokio::spawn(async move { router.submit_utterance("hello").await })
    };
    entered.notified().await;

    assert_eq!(
        router.select_provider(ProviderKind::Local),
        Err(RouterError::SelectionLocked)
    );
    assert_eq!(router.selected_provider(), ProviderKind::Gemini);

    release.notify_one();
    in_flight.await.unwrap();
    assert!(router.select_provider(ProviderKind::Local).is_ok());
    assert_eq!(router.selected_provider(), ProviderKind::Local);
}

#[tokio::test]
async fn test_cooling_down_drops_then_recovers() {
    let router = ResponseRouter::new(&config(ProviderKind::Local), ProviderSet::new())
        .with_rng(StdRng::seed_from_u64(SEED))
        .with_cooldown(Duration::from_millis(150));

    assert!(router.submit_utterance("hello").await.is_some());
    assert_eq!(router.state(), RouterState::CoolingDown);
    assert_eq!(router.submit_utterance("again").await, None);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(router.state(), RouterState::Idle);
    assert!(router.submit_utterance("again").await.is_some());
}

#[tokio::test]
async fn test_reply_sink_receives_every_result() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let adapter = Arc::new(FakeAdapter::new(
        ProviderKind::Gemini,
        Ok(Generation::RateLimited),
    ));
    let router = router_with(
        ProviderKind::Gemini,
        ProviderSet::new().with_gemini(adapter),
    )
    .with_reply_sink(tx);

    let returned = router.submit_utterance("hi").await.unwrap();
    router.select_provider(ProviderKind::Local).unwrap();
    router.submit_utterance("thanks").await;
    router.submit_utterance(" ").await;

    assert_eq!(
        rx.recv().await,
        Some(RoutedReply {
            provider: ProviderKind::Gemini,
            reply: returned,
        })
    );
    let local = rx.recv().await.unwrap();
    assert_eq!(local.provider, ProviderKind::Local);
    assert!(local.reply.as_text().is_some());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_sink_names_turn_provider_after_switch() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let adapter = Arc::new(FakeAdapter::new(
        ProviderKind::Gemini,
        Ok(Generation::RateLimited),
    ));
    let router = ResponseRouter::new(
        &config(ProviderKind::Gemini),
        ProviderSet::new().with_gemini(adapter),
    )
    .with_cooldown(Duration::from_secs(30))
    .with_reply_sink(tx);

    router.submit_utterance("hello").await.unwrap();
    // Switching during cool-down must not relabel the delivered reply
    router.select_provider(ProviderKind::OpenAi).unwrap();

    let routed = rx.recv().await.unwrap();
    assert_eq!(routed.provider, ProviderKind::Gemini);
    assert!(routed.reply.is_rate_limited());
    assert_eq!(router.selected_provider(), ProviderKind::OpenAi);
}
