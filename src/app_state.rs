use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    credentials::check_credentials,
    fetch::{FetchError, ImageFetcher},
    openai::{GenerationError, OpenAiClient, TextGenerator},
    vision::{LabelDetector, VisionClient},
};

/// Shared application state passed to all route handlers. Built once at
/// startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub fetcher: Arc<ImageFetcher>,
    /// Absent when the Google credentials could not produce a client.
    pub labels: Option<Arc<dyn LabelDetector>>,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        fetcher: ImageFetcher,
        labels: Option<Arc<dyn LabelDetector>>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            labels,
            generator,
        }
    }

    /// Build the production clients from configuration. Bad Google credentials
    /// are logged and leave the label detector unset rather than failing.
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let timeout = config.http_timeout();
        let fetcher = ImageFetcher::new(timeout)?;
        let labels = init_vision_client(&config);

        let generator = OpenAiClient::new(
            config.openai_api_key.clone().unwrap_or_default(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            timeout,
        )?;

        Ok(Self::new(config, fetcher, labels, Arc::new(generator)))
    }
}

fn init_vision_client(config: &AppConfig) -> Option<Arc<dyn LabelDetector>> {
    let status = check_credentials(config);
    if !status.google {
        tracing::error!(errors = ?status.errors, "Google Vision client not initialized");
        return None;
    }

    let raw = config.google_credentials.as_deref()?;
    tracing::info!(length = raw.len(), "Found Google credentials, initializing Vision client");

    match VisionClient::from_credentials_json(raw, config.vision_endpoint.clone(), config.http_timeout()) {
        Ok(client) => {
            tracing::info!("Google Vision client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Google Vision client");
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to build image fetcher: {0}")]
    Fetcher(#[from] FetchError),

    #[error("Failed to build generation client: {0}")]
    Generator(#[from] GenerationError),
}
