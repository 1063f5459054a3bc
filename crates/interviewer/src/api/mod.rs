mod conversations;
mod health;
mod interview;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::error;

use interviewer_core::{InterviewError, InterviewService};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InterviewService>,
}

pub fn create_router(service: Arc<InterviewService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/api/server-check", get(health::server_check))
        .route(
            "/api/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route("/api/conversations/{id}", get(conversations::get_conversation))
        .route(
            "/api/conversations/{id}/status",
            put(conversations::update_status),
        )
        .route(
            "/api/conversations/{id}/interview",
            post(interview::start_interview),
        )
        .route("/api/conversations/{id}/answers", post(interview::submit_answer))
        .route("/api/conversations/{id}/report", get(interview::get_report))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Map an interview error onto an HTTP status.
///
/// Oracle and storage details are logged but not sent to the client.
pub fn error_response(err: InterviewError) -> (StatusCode, String) {
    match err {
        InterviewError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        InterviewError::NotStarted(_)
        | InterviewError::AlreadyStarted(_)
        | InterviewError::Invariant(_) => (StatusCode::CONFLICT, err.to_string()),
        InterviewError::QuestionGeneration { step, ref source } => {
            error!(step = %step, error = %source, "Question generation failed");
            (
                StatusCode::BAD_GATEWAY,
                "Could not generate the next question, please retry".to_string(),
            )
        }
        InterviewError::Store(ref e) => {
            error!(error = %e, "Storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage failure".to_string(),
            )
        }
    }
}
