//! Google Cloud Vision `images:annotate` client.

use super::{AnnotationService, VisionError};
use crate::models::{BatchAnnotateImagesRequest, BatchAnnotateImagesResponse};
use crate::services::credentials::{ServiceAccountKey, TokenSource, CLOUD_PLATFORM_SCOPE};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use service_core::observability::trace_headers;
use std::time::Duration;

pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct GoogleVisionConfig {
    /// API root, e.g. `https://vision.googleapis.com/v1`.
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GoogleVisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

pub struct GoogleVisionClient {
    config: GoogleVisionConfig,
    client: Client,
    tokens: TokenSource,
}

/// Google's JSON error envelope: `{"error": {"code": 403, "message": "..."}}`.
#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GoogleVisionClient {
    pub fn new(config: GoogleVisionConfig, key: ServiceAccountKey) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisionError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let tokens = TokenSource::new(key, CLOUD_PLATFORM_SCOPE, client.clone())?;

        tracing::info!(
            endpoint = %config.endpoint,
            client_email = %tokens.client_email(),
            "Vision client configured"
        );

        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    fn annotate_url(&self) -> String {
        format!(
            "{}/images:annotate",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl AnnotationService for GoogleVisionClient {
    async fn annotate(
        &self,
        batch: &BatchAnnotateImagesRequest,
    ) -> Result<BatchAnnotateImagesResponse, VisionError> {
        let token = self.tokens.access_token().await?;

        tracing::debug!(
            requests = batch.requests.len(),
            "Sending annotate request to Vision API"
        );

        let response = self
            .client
            .post(self.annotate_url())
            .headers(trace_headers())
            .bearer_auth(token)
            .json(batch)
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);

            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<BatchAnnotateImagesResponse>()
            .await
            .map_err(|e| VisionError::Decode(e.to_string()))
    }
}
