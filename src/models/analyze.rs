use garde::Validate;
use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`.
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    #[serde(rename = "imageUrl", default)]
    #[garde(length(min = 1))]
    pub image_url: String,
}

/// Successful analysis. `item_specifics` is the generator's JSON text, passed
/// through verbatim once it has been confirmed to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub item_specifics: String,
    pub labels: Vec<String>,
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
