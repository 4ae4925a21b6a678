mod client;
mod config;
mod parse;

pub use client::{AssistantError, HttpAssistant, TextGenerator};
pub use config::AssistantConfig;
pub use parse::{extract_json_block, extraction_prompt, parse_requirement_hint, reply_prompt};

use tracing::debug;

use crate::ConversationMessage;
use crate::matching::RequirementHint;

/// Opening message for a new conversation. Sent without touching the
/// model so starting a conversation never blocks on the provider.
pub const GREETING: &str = "Hi! I'm your AI assistant. I can help you find the perfect \
freelancer for your project. What are you looking for?";

/// Reply used whenever the model is unavailable or fails. The turn
/// still proceeds; matching falls back to raw keyword extraction.
pub const FALLBACK_REPLY: &str = "I understand you're looking for a freelancer. Could you \
tell me more about what you need? For example, what skills or services are you looking for?";

/// Outcome of one conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantTurn {
    pub reply: String,
    pub requirement: Option<RequirementHint>,
    pub ready_to_match: bool,
}

impl AssistantTurn {
    /// Turn used when no assistant is configured at all.
    pub fn fallback() -> Self {
        Self {
            reply: FALLBACK_REPLY.to_string(),
            requirement: None,
            ready_to_match: true,
        }
    }
}

/// Run one conversation turn: produce a reply to the buyer and distill
/// the conversation so far into a structured requirement hint.
///
/// Every failure mode degrades instead of erroring: a failed reply
/// becomes [`FALLBACK_REPLY`], a failed extraction leaves the hint
/// empty and lets the caller match on the raw message text.
pub async fn advance_conversation<G>(
    generator: &G,
    history: &[ConversationMessage],
    message: &str,
) -> AssistantTurn
where
    G: TextGenerator + Sync,
{
    let reply = match generator.generate(&reply_prompt(history, message)).await {
        Ok(reply) => reply,
        Err(error) => {
            debug!(%error, "assistant reply failed, using fallback");
            FALLBACK_REPLY.to_string()
        }
    };

    let mut transcript: Vec<ConversationMessage> = history.to_vec();
    transcript.push(ConversationMessage::user(message));

    let (requirement, ready_to_match) =
        match generator.generate(&extraction_prompt(&transcript)).await {
            Ok(raw) => match parse_requirement_hint(&raw) {
                Some(hint) => {
                    let ready = hint.has_terms();
                    (Some(hint), ready)
                }
                None => (None, true),
            },
            Err(error) => {
                debug!(%error, "requirement extraction failed, matching on raw text");
                (None, true)
            }
        };

    AssistantTurn {
        reply,
        requirement,
        ready_to_match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, AssistantError>>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<String, AssistantError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, AssistantError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AssistantError::Exhausted))
        }
    }

    #[tokio::test]
    async fn successful_turn_carries_reply_and_hint() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Great, let me find React experts for you!".into()),
            Ok("{\"skills\": [\"React\"], \"keywords\": [\"frontend\"]}".into()),
        ]);

        let turn = advance_conversation(&generator, &[], "I need a React developer").await;

        assert_eq!(turn.reply, "Great, let me find React experts for you!");
        let hint = turn.requirement.unwrap();
        assert_eq!(hint.skills, vec!["React"]);
        assert!(turn.ready_to_match);
    }

    #[tokio::test]
    async fn failed_reply_falls_back_but_extraction_still_runs() {
        let generator = ScriptedGenerator::new(vec![
            Err(AssistantError::Exhausted),
            Ok("{\"keywords\": [\"logo\"]}".into()),
        ]);

        let turn = advance_conversation(&generator, &[], "logo please").await;

        assert_eq!(turn.reply, FALLBACK_REPLY);
        assert!(turn.requirement.is_some());
        assert!(turn.ready_to_match);
    }

    #[tokio::test]
    async fn failed_extraction_still_signals_ready() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Tell me more!".into()),
            Ok("not json at all".into()),
        ]);

        let turn = advance_conversation(&generator, &[], "I need help").await;

        assert!(turn.requirement.is_none());
        assert!(turn.ready_to_match);
    }

    #[tokio::test]
    async fn empty_hint_defers_matching() {
        let generator = ScriptedGenerator::new(vec![
            Ok("What kind of project is it?".into()),
            Ok("{\"skills\": [], \"keywords\": []}".into()),
        ]);

        let turn = advance_conversation(&generator, &[], "hello").await;

        assert!(turn.requirement.is_some());
        assert!(!turn.ready_to_match);
    }
}
