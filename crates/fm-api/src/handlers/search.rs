use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use fm_core::MatchResult;
use fm_core::matching::normalize;

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub results: Vec<MatchResult>,
}

/// One-shot search: free text in, ranked matches out.
pub async fn search(
    State(state): State<SharedState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("prompt is required".into()));
    }

    let requirement = normalize(prompt, None);
    let results = state.pipeline.run(&requirement).await?;

    info!(
        terms = requirement.terms().len(),
        results = results.len(),
        "search completed"
    );

    Ok(Json(SearchResponse {
        total: results.len(),
        results,
    }))
}
