//! Wire types for the Vision `images:annotate` call.
//!
//! Requests are fully typed. Responses are kept as raw JSON: the relay hands
//! them back to the caller untouched, so it never needs their fields.

use crate::features::FeatureRequest;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image bytes, standard base64 with padding.
    pub content: String,
}

impl Image {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            content: STANDARD.encode(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateImageRequest {
    pub image: Image,
    pub features: Vec<FeatureRequest>,
}

impl AnnotateImageRequest {
    pub fn new(image_bytes: &[u8], features: Vec<FeatureRequest>) -> Self {
        Self {
            image: Image::from_bytes(image_bytes),
            features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAnnotateImagesRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

impl BatchAnnotateImagesRequest {
    pub fn single(request: AnnotateImageRequest) -> Self {
        Self {
            requests: vec![request],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAnnotateImagesResponse {
    /// One entry per request, in request order.
    #[serde(default)]
    pub responses: Vec<Value>,
}

impl BatchAnnotateImagesResponse {
    pub fn into_first(self) -> Option<Value> {
        self.responses.into_iter().next()
    }
}
