//! Rule-based responder.
//!
//! Matches a lower-cased utterance against an ordered list of intent rules and
//! answers with a random reply from the first rule that matches. This is the
//! last-resort path behind every provider, so it cannot fail.

use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;

/// A pattern plus the canned replies it selects from.
#[derive(Debug, Clone)]
pub struct IntentRule {
    name: &'static str,
    matcher: Regex,
    reply_pool: Vec<String>,
}

impl IntentRule {
    /// Builds a rule.
    ///
    /// Returns `None` when the pool is empty, since a rule must always be able
    /// to answer.
    pub fn new(name: &'static str, matcher: Regex, reply_pool: Vec<String>) -> Option<Self> {
        if reply_pool.is_empty() {
            return None;
        }
        Some(Self {
            name,
            matcher,
            reply_pool,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn reply_pool(&self) -> &[String] {
        &self.reply_pool
    }

    fn matches(&self, lowered: &str) -> bool {
        self.matcher.is_match(lowered)
    }
}

// =============================================================================
// Built-in catalog
// =============================================================================

static BUILTIN_RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
    let mk = |name: &'static str, pattern: &str, pool: &[&str]| IntentRule {
        name,
        matcher: Regex::new(pattern).expect("Invalid intent regex"),
        reply_pool: pool.iter().map(|s| s.to_string()).collect(),
    };

    // Order is priority: the first matching rule wins.
    vec![
        mk(
            "greeting",
            r"\b(hi|hello|hey|good morning|good afternoon|good evening)\b",
            &[
                "Hello! Great to meet you! I'm Thio, and I'm here to help with whatever you need.",
                "Hey there! I'm Thio, your friendly AI assistant. What's on your mind today?",
                "Hi! I'm Thio, and I'm excited to chat with you. How can I assist you today?",
            ],
        ),
        mk(
            "how_are_you",
            r"how are you|how're you|how do you feel",
            &[
                "I'm doing fantastic, thanks for asking! I'm always ready to help and chat. How are you doing?",
                "I'm great! Every conversation is a new adventure for me. What about you?",
                "Doing wonderful! I love meeting new people and helping out. How's your day going?",
            ],
        ),
        mk(
            "capabilities",
            r"what can you do|what are you capable of|help me|what do you do",
            &[
                "I can help you with lots of things! I can answer questions, have conversations, help with problem-solving, provide advice, or just chat about whatever interests you. What would you like to explore?",
                "I'm here to assist with anything you need - whether it's answering questions, brainstorming ideas, having a friendly chat, or helping you work through problems. What can I help you with?",
                "Great question! I can help with information, creative tasks, problem-solving, casual conversation, advice, and much more. Think of me as your friendly AI companion ready for any challenge!",
            ],
        ),
        mk(
            "thanks",
            r"thank you|thanks|thx|appreciate",
            &[
                "You're absolutely welcome! I'm always happy to help. Is there anything else you'd like to chat about?",
                "My pleasure! That's what I'm here for. Feel free to ask me anything else!",
                "Glad I could help! I'm here whenever you need me. What else can we explore together?",
            ],
        ),
        mk(
            "goodbye",
            r"bye|goodbye|see you|farewell|take care",
            &[
                "It was great chatting with you! Feel free to come back anytime. Take care!",
                "Goodbye! Thanks for the wonderful conversation. Hope to chat again soon!",
                "See you later! Remember, I'm always here when you need a friendly chat or some help!",
            ],
        ),
        mk(
            "name",
            r"what.*name|who are you|introduce yourself",
            &[
                "I'm Thio, your friendly AI voice assistant! I'm here to help you with questions, have conversations, or just chat about whatever's on your mind. What would you like to talk about?",
            ],
        ),
        mk(
            "technology",
            r"artificial intelligence|ai|robot|computer|technology",
            &[
                "I'm an AI assistant, which means I'm a computer program designed to understand and respond to human language. I love talking about technology! I'm here to help make your day a bit easier and more interesting. What would you like to know?",
            ],
        ),
        mk(
            "help_with",
            r"help.*with|assist.*with|support.*with",
            &[
                "I'd be happy to help! I can assist with answering questions, brainstorming ideas, explaining concepts, having discussions, or just being a friendly chat companion. What specifically would you like help with?",
            ],
        ),
    ]
});

const DEFAULT_POOL: &[&str] = &[
    "That's interesting! I'd love to help you with that. Could you tell me a bit more about what you're thinking?",
    "Great question! I'm always eager to learn and discuss new topics. Can you give me some more details?",
    "I find that fascinating! While I might not have all the answers, I'm here to explore ideas with you. What aspects interest you most?",
    "That's a thoughtful question! I'd like to help you think through that. What's your take on it?",
    "Interesting topic! I enjoy having conversations about all sorts of things. What got you thinking about this?",
    "I appreciate you sharing that with me! I'm here to listen and help however I can. What would you like to explore further?",
    "That sounds like something worth discussing! I'm curious to hear more of your thoughts on this.",
    "Thanks for bringing that up! I love learning about different perspectives. What's your experience with this?",
    "That's a great point to consider! I'm here to chat about whatever interests you. Tell me more about your thoughts on this.",
    "I find conversations like this really engaging! While I may not have all the answers, I'm happy to explore ideas with you. What aspects are you most curious about?",
];

// =============================================================================
// RuleBasedResponder
// =============================================================================

/// Canned-reply responder used for local mode and provider fallback.
#[derive(Debug, Clone)]
pub struct RuleBasedResponder {
    rules: Vec<IntentRule>,
    default_pool: Vec<String>,
}

impl RuleBasedResponder {
    /// Creates a responder from custom rules.
    ///
    /// Returns `None` when `default_pool` is empty.
    pub fn new(rules: Vec<IntentRule>, default_pool: Vec<String>) -> Option<Self> {
        if default_pool.is_empty() {
            return None;
        }
        Some(Self {
            rules,
            default_pool,
        })
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn default_pool(&self) -> &[String] {
        &self.default_pool
    }

    /// Name of the first rule matching `utterance`, or `None` for the default pool.
    pub fn classify(&self, utterance: &str) -> Option<&'static str> {
        let lowered = utterance.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(IntentRule::name)
    }

    /// Answers `utterance` using the thread-local random generator.
    pub fn respond(&self, utterance: &str) -> String {
        self.respond_with(utterance, &mut rand::thread_rng())
    }

    /// Answers `utterance` drawing from `rng`.
    pub fn respond_with<R: Rng + ?Sized>(&self, utterance: &str, rng: &mut R) -> String {
        let lowered = utterance.to_lowercase();
        let pool = self
            .rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(IntentRule::reply_pool)
            .unwrap_or(self.default_pool.as_slice());

        // Pools are non-empty by construction.
        pool.choose(rng).cloned().unwrap_or_default()
    }
}

impl Default for RuleBasedResponder {
    fn default() -> Self {
        Self {
            rules: BUILTIN_RULES.clone(),
            default_pool: DEFAULT_POOL.iter().map(|s| s.to_string()).collect(),
        }
    }
}
