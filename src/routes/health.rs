use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::app_state::AppState;
use crate::models::credentials::CredentialStatus;
use crate::services::credentials::check_credentials;

pub const LIVENESS_MESSAGE: &str = "Auto Specifics API is running!";

#[derive(Serialize)]
pub struct PingResponse {
    pub status: String,
    pub time: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub server: String,
    pub credentials: CredentialStatus,
    pub time: String,
}

#[derive(Serialize)]
pub struct EchoResponse {
    pub success: bool,
    pub message: String,
    pub received: Value,
}

/// GET / — plain-text liveness string.
pub async fn index() -> &'static str {
    LIVENESS_MESSAGE
}

/// GET /ping — always ok, independent of credential state.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
        time: now_iso8601(),
    })
}

/// GET /status — server liveness plus a fresh credential check.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        server: "running".to_string(),
        credentials: check_credentials(&state.config),
        time: now_iso8601(),
    })
}

/// POST /test — echo the posted JSON back. Non-JSON or unreadable bodies echo
/// as `null`.
pub async fn echo(body: Result<Bytes, BytesRejection>) -> Json<EchoResponse> {
    let received = body
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or(Value::Null);
    Json(EchoResponse {
        success: true,
        message: "Test successful".to_string(),
        received,
    })
}

fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}
