//! In-memory annotator for tests.

use super::{AnnotationService, VisionError};
use crate::models::{BatchAnnotateImagesRequest, BatchAnnotateImagesResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

enum Reply {
    Responses(Vec<Value>),
    Failure { status: u16, message: String },
}

/// Replies with a canned outcome and remembers every batch it was given.
pub struct MockAnnotationService {
    reply: Reply,
    received: Mutex<Vec<BatchAnnotateImagesRequest>>,
}

impl MockAnnotationService {
    /// Answer every batch with `response` as the single entry.
    pub fn with_response(response: Value) -> Self {
        Self::with_responses(vec![response])
    }

    pub fn with_responses(responses: Vec<Value>) -> Self {
        Self {
            reply: Reply::Responses(responses),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Fail every batch as if the API returned `status`.
    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Failure {
                status,
                message: message.into(),
            },
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<BatchAnnotateImagesRequest> {
        self.received
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnnotationService for MockAnnotationService {
    async fn annotate(
        &self,
        batch: &BatchAnnotateImagesRequest,
    ) -> Result<BatchAnnotateImagesResponse, VisionError> {
        if let Ok(mut received) = self.received.lock() {
            received.push(batch.clone());
        }

        match &self.reply {
            Reply::Responses(responses) => Ok(BatchAnnotateImagesResponse {
                responses: responses.clone(),
            }),
            Reply::Failure { status, message } => Err(VisionError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}
