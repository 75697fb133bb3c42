use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::models::analyze::ErrorBody;
use crate::services::fetch::FetchError;
use crate::services::openai::GenerationError;
use crate::services::vision::VisionError;

/// Every way an analyze request can fail. [`AnalyzeError::status_code`] is the
/// only place a failure is mapped to an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Config { message: String, details: Value },

    #[error("Failed to download image: {status}")]
    Download { status: u16 },

    #[error("{provider} service error: {detail}")]
    Service { provider: &'static str, detail: String },

    #[error("generation API key is invalid")]
    Auth,

    #[error("Generation API error: {0}")]
    Provider(String),

    #[error("Error generating specifics: {0}")]
    Transport(String),

    #[error("Invalid JSON response from generation service")]
    InvalidResponse,

    #[error("{0}")]
    Unexpected(String),
}

impl AnalyzeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyzeError::BadRequest(_) | AnalyzeError::Download { .. } => StatusCode::BAD_REQUEST,
            AnalyzeError::Config { .. }
            | AnalyzeError::Service { .. }
            | AnalyzeError::Auth
            | AnalyzeError::Provider(_)
            | AnalyzeError::Transport(_)
            | AnalyzeError::InvalidResponse
            | AnalyzeError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-friendly name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyzeError::BadRequest(_) => "bad_request",
            AnalyzeError::Config { .. } => "config",
            AnalyzeError::Download { .. } => "download",
            AnalyzeError::Service { .. } => "service",
            AnalyzeError::Auth => "auth",
            AnalyzeError::Provider(_) => "provider",
            AnalyzeError::Transport(_) => "transport",
            AnalyzeError::InvalidResponse => "invalid_response",
            AnalyzeError::Unexpected(_) => "unexpected",
        }
    }

    fn body(&self) -> ErrorBody {
        let details = match self {
            AnalyzeError::Config { details, .. } => Some(details.clone()),
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            details,
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<FetchError> for AnalyzeError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status(status) => AnalyzeError::Download {
                status: status.as_u16(),
            },
            FetchError::Http(e) => AnalyzeError::Unexpected(format!("Image request failed: {}", e)),
        }
    }
}

impl From<VisionError> for AnalyzeError {
    fn from(err: VisionError) -> Self {
        AnalyzeError::Service {
            provider: "vision",
            detail: err.to_string(),
        }
    }
}

impl From<GenerationError> for AnalyzeError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Auth => AnalyzeError::Auth,
            GenerationError::Provider(detail) => AnalyzeError::Provider(detail),
            GenerationError::Transport(detail) => AnalyzeError::Transport(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(AnalyzeError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AnalyzeError::Download { status: 404 }.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AnalyzeError::Auth.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AnalyzeError::InvalidResponse.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AnalyzeError::Service { provider: "vision", detail: "denied".into() }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_download_message_carries_status() {
        let err: AnalyzeError = FetchError::Status(reqwest::StatusCode::NOT_FOUND).into();
        assert_eq!(err.to_string(), "Failed to download image: 404");
    }

    #[test]
    fn test_generation_errors_map_one_to_one() {
        let err: AnalyzeError = GenerationError::Auth.into();
        assert_eq!(err.to_string(), "generation API key is invalid");

        let err: AnalyzeError = GenerationError::Provider("500: overloaded".into()).into();
        assert_eq!(err.to_string(), "Generation API error: 500: overloaded");
        assert_eq!(err.kind(), "provider");
    }

    #[test]
    fn test_only_config_errors_carry_details() {
        let config = AnalyzeError::Config {
            message: "Credential issues".into(),
            details: serde_json::json!(["OPENAI_API_KEY not found in environment"]),
        };
        let body = serde_json::to_value(config.body()).unwrap();
        assert_eq!(body["error"], "Credential issues");
        assert_eq!(body["details"][0], "OPENAI_API_KEY not found in environment");

        let body = serde_json::to_value(AnalyzeError::InvalidResponse.body()).unwrap();
        assert!(body.get("details").is_none());
    }
}
