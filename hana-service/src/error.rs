use crate::features::InvalidFeatureError;
use crate::services::vision::VisionError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::response::{IntoResponse, Response};
use service_core::error::AppError;
use thiserror::Error;

/// Everything that can go wrong while relaying one image.
///
/// All variants answer 400 with the error text as the body.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("missing multipart file field \"image\"")]
    MissingImage,

    #[error(transparent)]
    InvalidFeature(#[from] InvalidFeatureError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("Vision API returned no annotation results")]
    EmptyResponse,

    #[error("Failed to serialize annotation response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Annotation relay request failed");
        AppError::BadRequest(self.to_string()).into_response()
    }
}
