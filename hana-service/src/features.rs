//! Feature selection for annotate requests.
//!
//! Callers name the analyses they want with short identifiers
//! (`"face,text"`); the Vision API expects its own enumeration names plus a
//! result cap per feature.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Result cap applied to every requested feature.
pub const MAX_RESULTS: u32 = 5;

/// Features requested by the `/hana/info` handler.
pub const DEFAULT_FEATURES: &str = "label";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid feature: {0}")]
pub struct InvalidFeatureError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    FaceDetection,
    LandmarkDetection,
    LogoDetection,
    LabelDetection,
    TextDetection,
    SafeSearchDetection,
    ImageProperties,
}

impl FeatureType {
    pub const ALL: [FeatureType; 7] = [
        FeatureType::FaceDetection,
        FeatureType::LandmarkDetection,
        FeatureType::LogoDetection,
        FeatureType::LabelDetection,
        FeatureType::TextDetection,
        FeatureType::SafeSearchDetection,
        FeatureType::ImageProperties,
    ];

    /// Name used by the Vision API.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::FaceDetection => "FACE_DETECTION",
            FeatureType::LandmarkDetection => "LANDMARK_DETECTION",
            FeatureType::LogoDetection => "LOGO_DETECTION",
            FeatureType::LabelDetection => "LABEL_DETECTION",
            FeatureType::TextDetection => "TEXT_DETECTION",
            FeatureType::SafeSearchDetection => "SAFE_SEARCH_DETECTION",
            FeatureType::ImageProperties => "IMAGE_PROPERTIES",
        }
    }

    /// Short identifier accepted from callers.
    pub fn identifier(&self) -> &'static str {
        match self {
            FeatureType::FaceDetection => "face",
            FeatureType::LandmarkDetection => "landmark",
            FeatureType::LogoDetection => "logo",
            FeatureType::LabelDetection => "label",
            FeatureType::TextDetection => "text",
            FeatureType::SafeSearchDetection => "safe_search",
            FeatureType::ImageProperties => "image_properties",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = InvalidFeatureError;

    /// Identifiers are matched exactly: no trimming, no case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face" => Ok(FeatureType::FaceDetection),
            "landmark" => Ok(FeatureType::LandmarkDetection),
            "logo" => Ok(FeatureType::LogoDetection),
            "label" => Ok(FeatureType::LabelDetection),
            "text" => Ok(FeatureType::TextDetection),
            "safe_search" => Ok(FeatureType::SafeSearchDetection),
            "image_properties" => Ok(FeatureType::ImageProperties),
            other => Err(InvalidFeatureError(other.to_string())),
        }
    }
}

/// One analysis requested for an image, in Vision wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequest {
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    pub max_results: u32,
}

impl FeatureRequest {
    pub fn new(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            max_results: MAX_RESULTS,
        }
    }
}

/// Translate a comma-separated identifier list, preserving order.
///
/// Fails on the first unrecognized identifier. An empty segment (including
/// the empty string) is unrecognized.
pub fn parse_features(input: &str) -> Result<Vec<FeatureRequest>, InvalidFeatureError> {
    input
        .split(',')
        .map(|id| id.parse::<FeatureType>().map(FeatureRequest::new))
        .collect()
}
