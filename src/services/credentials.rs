use serde_json::Value;

use crate::config::AppConfig;
use crate::models::credentials::{CredentialStatus, REQUIRED_GOOGLE_FIELDS};

const OPENAI_KEY_PREFIX: &str = "sk-";
const OPENAI_KEY_MIN_LEN: usize = 20;

/// Check both upstream credentials as currently configured.
///
/// Recomputed on every call; nothing is cached. Errors are reported in a fixed
/// order: Google first, then OpenAI.
pub fn check_credentials(config: &AppConfig) -> CredentialStatus {
    let mut status = CredentialStatus::default();

    match non_empty(config.google_credentials.as_deref()) {
        None => status
            .errors
            .push("GOOGLE_CREDENTIALS not found in environment".to_string()),
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(blob) => {
                let missing = missing_google_fields(&blob);
                if missing.is_empty() {
                    status.google = true;
                } else {
                    status
                        .errors
                        .push(format!("Missing fields in Google credentials: {:?}", missing));
                }
            }
            Err(e) => status
                .errors
                .push(format!("Invalid Google credentials JSON: {}", e)),
        },
    }

    match non_empty(config.openai_api_key.as_deref()) {
        None => status
            .errors
            .push("OPENAI_API_KEY not found in environment".to_string()),
        Some(key) if is_valid_openai_key(key) => status.openai = true,
        Some(_) => status
            .errors
            .push("Invalid OpenAI API key format".to_string()),
    }

    status
}

/// Required service-account keys absent from `blob`, in declaration order.
/// A blob that is not a JSON object is missing all of them.
pub fn missing_google_fields(blob: &Value) -> Vec<&'static str> {
    REQUIRED_GOOGLE_FIELDS
        .iter()
        .copied()
        .filter(|field| blob.get(field).is_none())
        .collect()
}

fn is_valid_openai_key(key: &str) -> bool {
    key.starts_with(OPENAI_KEY_PREFIX) && key.len() > OPENAI_KEY_MIN_LEN
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
