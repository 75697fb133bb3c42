use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Google service-account key, as the raw JSON blob.
    pub google_credentials: Option<String>,

    /// OpenAI API key (`sk-...`)
    pub openai_api_key: Option<String>,

    /// Listen port; the server binds on all interfaces.
    #[serde(default = "default_port")]
    pub port: u16,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Chat model used to generate item specifics
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Cloud Vision `images:annotate` endpoint
    #[serde(default = "default_vision_endpoint")]
    pub vision_endpoint: String,

    /// Per-call timeout for outbound HTTP. Unset means no timeout.
    pub http_timeout_secs: Option<u64>,

    /// Maximum accepted request body size
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_vision_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_credentials: None,
            openai_api_key: None,
            port: default_port(),
            openai_base_url: default_openai_base_url(),
            openai_model: default_openai_model(),
            vision_endpoint: default_vision_endpoint(),
            http_timeout_secs: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}
