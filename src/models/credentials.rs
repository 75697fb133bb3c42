use serde::{Deserialize, Serialize};

/// Keys a Google service-account blob must carry to be usable.
pub const REQUIRED_GOOGLE_FIELDS: [&str; 4] = ["type", "project_id", "private_key", "client_email"];

/// Result of checking the configured upstream credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CredentialStatus {
    pub google: bool,
    pub openai: bool,
    pub errors: Vec<String>,
}

impl CredentialStatus {
    pub fn is_ready(&self) -> bool {
        self.google && self.openai
    }
}

/// The subset of a service-account key file used to mint access tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
