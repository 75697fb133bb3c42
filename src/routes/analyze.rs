use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AnalyzeError;
use crate::models::analyze::AnalyzeResponse;
use crate::services::pipeline::AnalyzePipeline;

/// POST /analyze — describe the clothing item behind an image URL.
///
/// The body is read as raw bytes so malformed or oversized bodies are reported
/// through the same error body as every other failure.
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id, image_url = tracing::field::Empty);

    async move {
        let body = body.map_err(|rejection| {
            tracing::warn!(error = %rejection.body_text(), "Unreadable analyze body");
            AnalyzeError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
        })?;

        tracing::info!(body_len = body.len(), "Received analyze request");
        let response = AnalyzePipeline::new(&state).run(&body).await?;
        tracing::info!(labels = response.labels.len(), "Sending analyze response");
        Ok::<_, AnalyzeError>(Json(response))
    }
    .instrument(span)
    .await
}
