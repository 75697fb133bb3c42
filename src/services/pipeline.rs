use std::time::Instant;

use garde::Validate;
use serde_json::Value;
use strum::Display;
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::error::AnalyzeError;
use crate::models::analyze::{AnalyzeRequest, AnalyzeResponse};
use crate::services::credentials::check_credentials;
use crate::services::prompt::{build_prompt, ITEM_FIELDS};

const BODY_PREVIEW_BYTES: usize = 256;

/// Steps of one analyze request, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Idle,
    ValidatingInput,
    CheckingCredentials,
    Downloading,
    Labeling,
    Prompting,
    Generating,
    ValidatingOutput,
    Responding,
}

/// One run of download → label → prompt → generate. Created per request and
/// dropped afterwards; only the shared, read-only [`AppState`] outlives it.
pub struct AnalyzePipeline<'a> {
    state: &'a AppState,
    stage: Stage,
    image_url: Option<String>,
}

impl<'a> AnalyzePipeline<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            stage: Stage::Idle,
            image_url: None,
        }
    }

    /// Run the whole pipeline against a raw request body. On failure the error
    /// is logged with the stage reached and returned for the boundary to map.
    pub async fn run(mut self, body: &[u8]) -> Result<AnalyzeResponse, AnalyzeError> {
        let start = Instant::now();
        metrics::counter!("analyze_requests_total").increment(1);

        let result = self.execute(body).await;

        metrics::histogram!("analyze_processing_seconds").record(start.elapsed().as_secs_f64());
        if let Err(ref e) = result {
            metrics::counter!(
                "analyze_failures_total",
                "stage" => self.stage.to_string(),
                "kind" => e.kind()
            )
            .increment(1);
            let image_url = self.image_url.as_deref().unwrap_or_default();
            if e.status_code().is_server_error() {
                error!(stage = %self.stage, error = %e, image_url, "Analyze request failed");
            } else {
                warn!(
                    stage = %self.stage,
                    error = %e,
                    image_url,
                    body_len = body.len(),
                    body = %body_preview(body),
                    "Analyze request rejected"
                );
            }
        }

        result
    }

    async fn execute(&mut self, body: &[u8]) -> Result<AnalyzeResponse, AnalyzeError> {
        self.enter(Stage::ValidatingInput);
        let request = parse_request(body)?;
        tracing::Span::current().record("image_url", request.image_url.as_str());
        info!(image_url = %request.image_url, "Processing image URL");
        self.image_url = Some(request.image_url.clone());

        self.enter(Stage::CheckingCredentials);
        let status = check_credentials(&self.state.config);
        if !status.is_ready() {
            return Err(AnalyzeError::Config {
                message: "Credential issues".to_string(),
                details: Value::from(status.errors),
            });
        }
        let Some(detector) = self.state.labels.as_ref() else {
            return Err(AnalyzeError::Config {
                message: "Google Vision client not initialized".to_string(),
                details: Value::from("Check server logs for initialization errors"),
            });
        };

        self.enter(Stage::Downloading);
        let image = self.state.fetcher.fetch(&request.image_url).await?;

        self.enter(Stage::Labeling);
        let labels = detector.detect_labels(&image).await?;
        drop(image);
        info!(?labels, "Vision labels detected");

        self.enter(Stage::Prompting);
        let prompt = build_prompt(&labels);

        self.enter(Stage::Generating);
        let item_specifics = self.state.generator.generate(&prompt).await?;

        self.enter(Stage::ValidatingOutput);
        validate_item_specifics(&item_specifics)?;

        self.enter(Stage::Responding);
        Ok(AnalyzeResponse {
            success: true,
            item_specifics,
            labels,
        })
    }

    fn enter(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "Pipeline stage");
        self.stage = stage;
    }
}

/// Leading part of a request body, lossily decoded, for log lines.
pub fn body_preview(body: &[u8]) -> String {
    let end = body.len().min(BODY_PREVIEW_BYTES);
    let mut preview = String::from_utf8_lossy(&body[..end]).into_owned();
    if body.len() > BODY_PREVIEW_BYTES {
        preview.push_str("...");
    }
    preview
}

/// Parse and validate the `/analyze` body.
pub fn parse_request(body: &[u8]) -> Result<AnalyzeRequest, AnalyzeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AnalyzeError::BadRequest("No JSON data received".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AnalyzeError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    match &value {
        Value::Null => return Err(AnalyzeError::BadRequest("No JSON data received".to_string())),
        Value::Object(map) if map.is_empty() => {
            return Err(AnalyzeError::BadRequest("No JSON data received".to_string()))
        }
        Value::Object(_) => {}
        _ => {
            return Err(AnalyzeError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ))
        }
    }

    let request: AnalyzeRequest = serde_json::from_value(value)
        .map_err(|e| AnalyzeError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    request
        .validate()
        .map_err(|_| AnalyzeError::BadRequest("No image URL provided".to_string()))?;

    Ok(request)
}

/// The generator's text must be a well-formed JSON object. The raw text stays in the
/// logs and never reaches the caller on failure.
fn validate_item_specifics(raw: &str) -> Result<(), AnalyzeError> {
    let parsed: Value = serde_json::from_str(raw).map_err(|e| {
        warn!(error = %e, raw, "Generator returned malformed JSON");
        AnalyzeError::InvalidResponse
    })?;
    if !parsed.is_object() {
        warn!(raw, "Generator returned JSON that is not an object");
        return Err(AnalyzeError::InvalidResponse);
    }

    let missing: Vec<&str> = ITEM_FIELDS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| parsed.get(name).is_none())
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "Item specifics lack expected fields");
    }

    debug!(item_specifics = raw, "Generator response accepted");
    Ok(())
}
