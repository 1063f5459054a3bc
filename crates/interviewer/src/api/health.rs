use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct ServerCheck {
    pub status: &'static str,
    pub server: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn server_check() -> Json<ServerCheck> {
    Json(ServerCheck {
        status: "ok",
        server: "interviewer",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}
