use std::time::Duration;

use reqwest::{Client, StatusCode};

/// Downloads the image referenced by an analyze request.
pub struct ImageFetcher {
    http: Client,
}

impl ImageFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(FetchError::Http)?;
        Ok(Self { http })
    }

    /// Fetch the raw bytes behind `url`. Any non-2xx answer is a `Status` error.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url).send().await.map_err(FetchError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await.map_err(FetchError::Http)?;

        match image::guess_format(&bytes) {
            Ok(format) => tracing::debug!(?format, size = bytes.len(), "Image downloaded"),
            Err(_) => tracing::warn!(size = bytes.len(), "Downloaded payload has no recognised image signature"),
        }

        Ok(bytes.to_vec())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to download image: {}", .0.as_u16())]
    Status(StatusCode),

    #[error("Image request failed: {0}")]
    Http(#[from] reqwest::Error),
}
