//! The external annotation capability.
//!
//! Handlers only see [`AnnotationService`]; the Google client and the mock
//! used in tests are interchangeable behind it.

pub mod google;
pub mod mock;

pub use google::{GoogleVisionClient, GoogleVisionConfig};
pub use mock::MockAnnotationService;

use crate::models::{BatchAnnotateImagesRequest, BatchAnnotateImagesResponse};
use crate::services::credentials::CredentialsError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] CredentialsError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Vision API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode Vision API response: {0}")]
    Decode(String),
}

impl VisionError {
    /// Label used for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            VisionError::Auth(_) => "auth_error",
            VisionError::Network(_) => "network_error",
            VisionError::Api { .. } => "api_error",
            VisionError::Decode(_) => "decode_error",
        }
    }
}

#[async_trait]
pub trait AnnotationService: Send + Sync {
    /// Submit a batch and return the service's batch response as-is.
    async fn annotate(
        &self,
        batch: &BatchAnnotateImagesRequest,
    ) -> Result<BatchAnnotateImagesResponse, VisionError>;
}
