use crate::error::RelayError;
use crate::features::{parse_features, DEFAULT_FEATURES};
use crate::models::{AnnotateImageRequest, BatchAnnotateImagesRequest};
use crate::services::metrics::record_annotation;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::time::Instant;

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image";

/// `POST /hana/info`: annotate the uploaded image and return the first
/// annotation result as tab-indented JSON.
pub async fn hana_info(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let image = read_image_field(&mut multipart?).await?;
    let features = parse_features(DEFAULT_FEATURES)?;

    tracing::info!(
        image_bytes = image.len(),
        features = DEFAULT_FEATURES,
        "Relaying image to annotation service"
    );

    let batch = BatchAnnotateImagesRequest::single(AnnotateImageRequest::new(&image, features));

    let started = Instant::now();
    let result = state.annotator.annotate(&batch).await;
    record_annotation(
        result.as_ref().map(|_| "success").unwrap_or_else(|e| e.kind()),
        started.elapsed(),
    );

    let first = result?.into_first().ok_or(RelayError::EmptyResponse)?;
    let body = to_indented_json(&first)?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// Bytes of the first field named [`IMAGE_FIELD`]. Other fields are skipped.
async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, RelayError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }

    Err(RelayError::MissingImage)
}

fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    Ok(buf)
}
