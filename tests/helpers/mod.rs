//! Test helpers: stub collaborators, a local image host and app bootstrap

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use auto_specifics::app_state::AppState;
use auto_specifics::config::AppConfig;
use auto_specifics::routes;
use auto_specifics::services::fetch::ImageFetcher;
use auto_specifics::services::openai::{GenerationError, TextGenerator};
use auto_specifics::services::vision::{LabelDetector, VisionError};

use crate::fixtures;

/// Label detector returning a fixed label set, or a fixed failure.
pub struct StubDetector {
    labels: Vec<String>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl StubDetector {
    pub fn returning(labels: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            labels,
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            labels: Vec::new(),
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LabelDetector for StubDetector {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<String>, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!image.is_empty(), "detector received an empty image");
        match &self.failure {
            Some(message) => Err(VisionError::Api(message.clone())),
            None => Ok(self.labels.clone()),
        }
    }
}

type Reply = Box<dyn Fn() -> Result<String, GenerationError> + Send + Sync>;

/// Text generator with a canned reply that records the prompts it was given.
pub struct StubGenerator {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::with(Box::new(move || Ok(text.clone())))
    }

    pub fn failing(make_error: fn() -> GenerationError) -> Arc<Self> {
        Self::with(Box::new(move || Err(make_error())))
    }

    fn with(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.reply)()
    }
}

/// Configuration with both credentials valid.
pub fn valid_config() -> AppConfig {
    AppConfig {
        google_credentials: Some(fixtures::GOOGLE_CREDENTIALS.to_string()),
        openai_api_key: Some(fixtures::OPENAI_API_KEY.to_string()),
        ..AppConfig::default()
    }
}

pub fn build_state(
    config: AppConfig,
    detector: Option<Arc<StubDetector>>,
    generator: Arc<StubGenerator>,
) -> AppState {
    let fetcher = ImageFetcher::new(None).expect("Failed to build image fetcher");
    let labels = detector.map(|d| d as Arc<dyn LabelDetector>);
    AppState::new(config, fetcher, labels, generator)
}

/// Serve the router on an ephemeral port and return its base URL.
pub async fn spawn_app(state: AppState) -> String {
    serve(routes::router(state, None)).await
}

/// Local image host: `/shirt.png` serves a PNG, `/missing.png` answers 404.
/// Every request, successful or not, bumps the returned counter.
pub async fn spawn_image_host() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/shirt.png", get(serve_png))
        .route("/missing.png", get(serve_missing))
        .with_state(hits.clone());

    (serve(app).await, hits)
}

async fn serve_png(State(hits): State<Arc<AtomicUsize>>) -> Vec<u8> {
    hits.fetch_add(1, Ordering::SeqCst);
    fixtures::png_bytes()
}

async fn serve_missing(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });
    format!("http://{}", addr)
}

/// POST a JSON value to `/analyze`, returning status and parsed body.
pub async fn post_analyze(
    client: &reqwest::Client,
    base_url: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = client
        .post(format!("{}/analyze", base_url))
        .json(body)
        .send()
        .await
        .expect("Analyze request failed");
    let status = response.status();
    let body = response.json().await.expect("Analyze response was not JSON");
    (status, body)
}
