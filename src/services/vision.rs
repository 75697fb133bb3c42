use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::credentials::ServiceAccountKey;

const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Turns image bytes into descriptive labels.
#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Labels in the order the service ranked them. May be empty.
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<String>, VisionError>;
}

/// Client for the Google Cloud Vision `images:annotate` REST endpoint,
/// authenticated with a service-account key held in memory.
pub struct VisionClient {
    http: Client,
    endpoint: String,
    client_email: String,
    token_uri: String,
    key_id: Option<String>,
    signing_key: EncodingKey,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageAnnotation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageAnnotation {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    error: Option<RpcStatus>,
}

#[derive(Deserialize)]
struct LabelAnnotation {
    description: String,
}

#[derive(Deserialize)]
struct RpcStatus {
    #[serde(default)]
    message: String,
}

impl VisionClient {
    /// Build a client from the raw service-account JSON blob.
    pub fn from_credentials_json(
        raw: &str,
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, VisionError> {
        let key: ServiceAccountKey =
            serde_json::from_str(raw).map_err(|e| VisionError::Credentials(e.to_string()))?;
        Self::new(key, endpoint, timeout)
    }

    pub fn new(
        key: ServiceAccountKey,
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, VisionError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| VisionError::Credentials(format!("invalid private key: {}", e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(VisionError::Http)?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            client_email: key.client_email,
            token_uri: key.token_uri,
            key_id: key.private_key_id,
            signing_key,
        })
    }

    /// Exchange a freshly signed JWT assertion for an OAuth access token.
    async fn access_token(&self) -> Result<String, VisionError> {
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: VISION_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        let assertion = jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| VisionError::Credentials(format!("failed to sign assertion: {}", e)))?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(VisionError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await.map_err(VisionError::Http)?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl LabelDetector for VisionClient {
    async fn detect_labels(&self, image: &[u8]) -> Result<Vec<String>, VisionError> {
        let token = self.access_token().await?;

        let request_body = serde_json::json!({
            "requests": [{
                "image": { "content": base64::engine::general_purpose::STANDARD.encode(image) },
                "features": [{ "type": "LABEL_DETECTION" }]
            }]
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request_body)
            .send()
            .await
            .map_err(VisionError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Api(format!("{}: {}", status, body)));
        }

        let annotated: AnnotateResponse = response.json().await.map_err(VisionError::Http)?;
        labels_from_response(annotated)
    }
}

fn labels_from_response(response: AnnotateResponse) -> Result<Vec<String>, VisionError> {
    let Some(annotation) = response.responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(error) = annotation.error {
        return Err(VisionError::Api(error.message));
    }

    Ok(annotation
        .label_annotations
        .into_iter()
        .map(|label| label.description)
        .collect())
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Invalid Google credentials: {0}")]
    Credentials(String),

    #[error("Google authentication failed: {0}")]
    Auth(String),

    #[error("Vision API error: {0}")]
    Api(String),

    #[error("Vision HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AnnotateResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_labels_keep_service_order() {
        let response = parse(
            r#"{"responses":[{"labelAnnotations":[
                {"description":"Clothing","score":0.97},
                {"description":"Sleeve","score":0.91},
                {"description":"T-shirt","score":0.88}
            ]}]}"#,
        );
        let labels = labels_from_response(response).unwrap();
        assert_eq!(labels, vec!["Clothing", "Sleeve", "T-shirt"]);
    }

    #[test]
    fn test_no_annotations_is_empty_label_set() {
        assert!(labels_from_response(parse(r#"{"responses":[{}]}"#)).unwrap().is_empty());
        assert!(labels_from_response(parse("{}")).unwrap().is_empty());
    }

    #[test]
    fn test_per_image_error_surfaces() {
        let response = parse(r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#);
        let err = labels_from_response(response).unwrap_err();
        assert!(matches!(err, VisionError::Api(ref msg) if msg == "Bad image data."));
    }

    #[test]
    fn test_rejects_malformed_credentials() {
        let err = VisionClient::from_credentials_json("{}", "http://localhost", None).err().unwrap();
        assert!(matches!(err, VisionError::Credentials(_)));

        let blob = r#"{"client_email":"svc@demo.iam","private_key":"not a pem"}"#;
        let err = VisionClient::from_credentials_json(blob, "http://localhost", None).err().unwrap();
        assert!(matches!(err, VisionError::Credentials(ref msg) if msg.starts_with("invalid private key")));
    }
}
