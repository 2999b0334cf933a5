//! Exercises the Vision client against an in-process stand-in for Google's
//! token and annotate endpoints.

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use hana_service::features::parse_features;
use hana_service::models::{AnnotateImageRequest, BatchAnnotateImagesRequest};
use hana_service::services::{
    AnnotationService, GoogleVisionClient, ServiceAccountKey, VisionError,
};
use hana_service::services::vision::GoogleVisionConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const FIXTURE: &str = include_str!("fixtures/service_account.json");
const PUBLIC_KEY: &str = include_str!("fixtures/test_key.pub.pem");
const CLIENT_EMAIL: &str = "hana-relay@hana-test.iam.gserviceaccount.com";
const FAKE_TOKEN: &str = "fake-token";

struct FakeGoogle {
    token_uri: String,
    token_status: StatusCode,
    annotate_status: StatusCode,
    token_calls: AtomicUsize,
    annotate_calls: AtomicUsize,
}

struct FakeServer {
    address: String,
    state: Arc<FakeGoogle>,
}

impl FakeServer {
    async fn start(token_status: StatusCode, annotate_status: StatusCode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(FakeGoogle {
            token_uri: format!("{}/token", address),
            token_status,
            annotate_status,
            token_calls: AtomicUsize::new(0),
            annotate_calls: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/token", post(token))
            .fallback(annotate)
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { address, state }
    }

    fn client(&self, endpoint: String) -> GoogleVisionClient {
        let mut key = ServiceAccountKey::from_json(FIXTURE).unwrap();
        key.token_uri = self.state.token_uri.clone();

        GoogleVisionClient::new(
            GoogleVisionConfig {
                endpoint,
                timeout: Duration::from_secs(5),
            },
            key,
        )
        .unwrap()
    }

    fn vision_client(&self) -> GoogleVisionClient {
        self.client(format!("{}/v1", self.address))
    }
}

async fn token(
    State(state): State<Arc<FakeGoogle>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_calls.fetch_add(1, Ordering::SeqCst);

    if !state.token_status.is_success() {
        return (state.token_status, "invalid_grant").into_response();
    }

    assert_eq!(
        form["grant_type"],
        "urn:ietf:params:oauth:grant-type:jwt-bearer"
    );

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[state.token_uri.as_str()]);
    validation.set_issuer(&[CLIENT_EMAIL]);
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap();
    let assertion = decode::<Value>(&form["assertion"], &key, &validation)
        .expect("assertion should verify against the fixture public key");

    assert_eq!(assertion.header.kid.as_deref(), Some("test-key-id"));
    assert_eq!(
        assertion.claims["scope"],
        "https://www.googleapis.com/auth/cloud-platform"
    );

    Json(json!({
        "access_token": FAKE_TOKEN,
        "expires_in": 3600,
        "token_type": "Bearer"
    }))
    .into_response()
}

async fn annotate(
    State(state): State<Arc<FakeGoogle>>,
    uri: Uri,
    headers: HeaderMap,
    Json(batch): Json<Value>,
) -> Response {
    state.annotate_calls.fetch_add(1, Ordering::SeqCst);

    assert_eq!(uri.path(), "/v1/images:annotate");
    assert_eq!(
        headers[header::AUTHORIZATION],
        format!("Bearer {}", FAKE_TOKEN)
    );
    assert_eq!(batch["requests"][0]["features"][0]["type"], "LABEL_DETECTION");
    assert_eq!(batch["requests"][0]["features"][0]["maxResults"], 5);

    if !state.annotate_status.is_success() {
        let body = json!({
            "error": {
                "code": state.annotate_status.as_u16(),
                "message": "Cloud Vision API has not been used in project hana-test",
                "status": "PERMISSION_DENIED"
            }
        });
        return (state.annotate_status, Json(body)).into_response();
    }

    Json(json!({
        "responses": [
            { "labelAnnotations": [{ "description": "Cat", "score": 0.98 }] }
        ]
    }))
    .into_response()
}

fn label_batch() -> BatchAnnotateImagesRequest {
    BatchAnnotateImagesRequest::single(AnnotateImageRequest::new(
        b"image bytes",
        parse_features("label").unwrap(),
    ))
}

#[tokio::test]
async fn annotate_passes_response_through() {
    let server = FakeServer::start(StatusCode::OK, StatusCode::OK).await;
    let client = server.vision_client();

    let response = client.annotate(&label_batch()).await.unwrap();

    assert_eq!(
        response.into_first().unwrap(),
        json!({ "labelAnnotations": [{ "description": "Cat", "score": 0.98 }] })
    );
}

#[tokio::test]
async fn access_token_is_reused_between_calls() {
    let server = FakeServer::start(StatusCode::OK, StatusCode::OK).await;
    let client = server.vision_client();

    client.annotate(&label_batch()).await.unwrap();
    client.annotate(&label_batch()).await.unwrap();

    assert_eq!(server.state.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(server.state.annotate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = FakeServer::start(StatusCode::OK, StatusCode::FORBIDDEN).await;
    let client = server.vision_client();

    let err = client.annotate(&label_batch()).await.unwrap_err();

    match err {
        VisionError::Api { status, ref message } => {
            assert_eq!(status, 403);
            assert_eq!(
                message,
                "Cloud Vision API has not been used in project hana-test"
            );
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn token_exchange_failure_is_auth_error() {
    let server = FakeServer::start(StatusCode::BAD_REQUEST, StatusCode::OK).await;
    let client = server.vision_client();

    let err = client.annotate(&label_batch()).await.unwrap_err();

    assert!(matches!(err, VisionError::Auth(_)));
    assert_eq!(err.kind(), "auth_error");
    assert_eq!(server.state.annotate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let server = FakeServer::start(StatusCode::OK, StatusCode::OK).await;
    let client = server.client("http://127.0.0.1:1/v1".to_string());

    let err = client.annotate(&label_batch()).await.unwrap_err();

    assert!(matches!(err, VisionError::Network(_)));
}
