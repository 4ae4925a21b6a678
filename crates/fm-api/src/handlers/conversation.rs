use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use fm_core::assistant::{AssistantTurn, advance_conversation};
use fm_core::matching::{CanonicalRequirement, normalize};
use fm_core::{ConversationMessage, MatchResult};

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct StartResponse {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub greeting: ConversationMessage,
}

/// Open a new conversation. The greeting is canned; the model is never
/// consulted here so starting a conversation is instant and works even
/// with the assistant disabled.
pub async fn start(State(state): State<SharedState>) -> Json<StartResponse> {
    let (conversation_id, greeting) = state.store.create();
    info!(%conversation_id, "conversation started");

    Json(StartResponse {
        conversation_id,
        greeting,
    })
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    // Clients send camelCase; the snake_case form is also accepted.
    #[serde(alias = "conversationId")]
    pub conversation_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: ConversationMessage,
    pub requirement: Option<CanonicalRequirement>,
    pub results: Vec<MatchResult>,
}

/// One conversation turn: reply to the buyer, refresh the distilled
/// requirement, and re-run matching when there is something to match.
pub async fn message(
    State(state): State<SharedState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conversation_id = request.conversation_id.trim();
    let text = request.message.trim();
    if conversation_id.is_empty() || text.is_empty() {
        return Err(ApiError::BadRequest(
            "conversation_id and message are required".into(),
        ));
    }

    let session = state
        .store
        .get(conversation_id)
        .ok_or_else(|| ApiError::NotFound("conversation not found".into()))?;
    let mut session = session.lock().await;

    let turn = match &state.assistant {
        Some(assistant) => advance_conversation(assistant, &session.messages, text).await,
        None => AssistantTurn::fallback(),
    };

    session.messages.push(ConversationMessage::user(text));
    let reply = ConversationMessage::bot(turn.reply.clone());
    session.messages.push(reply.clone());

    // The freshest requirement wins, but a turn that extracted nothing
    // must not wipe out what earlier turns learned.
    let merged = normalize(text, turn.requirement);
    if !merged.is_empty() {
        session.requirement = Some(merged);
    }

    let mut results = Vec::new();
    if turn.ready_to_match {
        if let Some(requirement) = session.requirement.clone() {
            if !requirement.is_empty() {
                results = state.pipeline.run(&requirement).await?;
                session.last_results = results.clone();
            }
        }
    }

    session.touch();
    info!(
        %conversation_id,
        results = results.len(),
        has_requirement = session.requirement.is_some(),
        "conversation turn completed"
    );

    Ok(Json(MessageResponse {
        reply,
        requirement: session.requirement.clone(),
        results,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub total: usize,
    pub results: Vec<MatchResult>,
    pub requirement: Option<CanonicalRequirement>,
}

/// Return the matches from the latest turn of a conversation.
pub async fn results(
    State(state): State<SharedState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let session = state
        .store
        .get(&conversation_id)
        .ok_or_else(|| ApiError::NotFound("conversation not found".into()))?;
    let session = session.lock().await;

    Ok(Json(ResultsResponse {
        total: session.last_results.len(),
        results: session.last_results.clone(),
        requirement: session.requirement.clone(),
    }))
}
