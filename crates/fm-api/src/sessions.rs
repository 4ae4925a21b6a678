use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fm_core::assistant::GREETING;
use fm_core::matching::CanonicalRequirement;
use fm_core::{ConversationMessage, MatchResult};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_CONVERSATION_TTL: Duration = Duration::from_secs(60 * 60);

/// Everything the server remembers about one conversation. Guests can
/// use the conversational search, so nothing here is tied to an
/// account.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub messages: Vec<ConversationMessage>,
    pub requirement: Option<CanonicalRequirement>,
    pub last_results: Vec<MatchResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: vec![ConversationMessage::bot(GREETING)],
            requirement: None,
            last_results: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// In-memory conversation store. Each conversation gets its own lock
/// so concurrent messages to the same conversation serialize while
/// different conversations proceed independently.
pub struct ConversationStore {
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<ConversationState>>>>,
    ttl: Duration,
}

impl ConversationStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn from_env() -> Self {
        let ttl = std::env::var("FM_CONVERSATION_TTL_SECONDS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONVERSATION_TTL);
        Self::new(ttl)
    }

    /// Create a conversation seeded with the greeting. Returns the new
    /// id and the greeting message.
    pub fn create(&self) -> (String, ConversationMessage) {
        let id = Uuid::new_v4().to_string();
        let state = ConversationState::new();
        let greeting = state.messages[0].clone();

        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id.clone(), Arc::new(tokio::sync::Mutex::new(state)));

        (id, greeting)
    }

    pub fn get(&self, id: &str) -> Option<Arc<tokio::sync::Mutex<ConversationState>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    /// Drop conversations idle past the TTL. Called periodically from
    /// a background task.
    pub fn expire_stale(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::hours(1));

        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = sessions.len();

        sessions.retain(|_, state| match state.try_lock() {
            Ok(state) => state.updated_at >= cutoff,
            // A held lock means the conversation is in use right now.
            Err(_) => true,
        });

        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, "expired stale conversations");
        }
        expired
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
