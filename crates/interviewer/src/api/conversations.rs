use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use interviewer_core::{Conversation, ConversationStatus, ConversationSummary};

use super::{error_response, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<Json<Conversation>> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "email is required".to_string()));
    }

    let conversation = state
        .service
        .create_conversation(email)
        .map_err(error_response)?;
    Ok(Json(conversation))
}

pub async fn list_conversations(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    let summaries = state.service.list_conversations().map_err(error_response)?;
    Ok(Json(summaries))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Conversation>> {
    let conversation = state.service.get_conversation(&id).map_err(error_response)?;
    Ok(Json(conversation))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ConversationSummary>> {
    let status: ConversationStatus = req
        .status
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;

    state
        .service
        .update_status(&id, status)
        .map_err(error_response)?;
    let conversation = state.service.get_conversation(&id).map_err(error_response)?;
    Ok(Json(conversation.summary()))
}
