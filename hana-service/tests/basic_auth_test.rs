mod common;

use axum::http::StatusCode;
use common::{image_form, label_response, TestApp, TEST_IMAGE};
use hana_service::services::MockAnnotationService;
use secrecy::Secret;
use service_core::middleware::basic_auth::BasicAuthCredentials;

async fn spawn_gated() -> TestApp {
    TestApp::spawn_with(
        MockAnnotationService::with_response(label_response()),
        Some(BasicAuthCredentials::new("u", Secret::new("p".to_string()))),
        1024 * 1024,
    )
    .await
}

#[tokio::test]
async fn request_without_credentials_is_challenged() {
    let app = spawn_gated().await;

    let response = app.post_image(TEST_IMAGE).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()["www-authenticate"],
        "Basic realm=\"Restricted\""
    );
    assert!(app.annotator.received().is_empty());
}

#[tokio::test]
async fn request_with_wrong_password_is_challenged() {
    let app = spawn_gated().await;

    let response = app
        .client
        .post(app.info_url())
        .basic_auth("u", Some("nope"))
        .multipart(image_form(TEST_IMAGE))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.annotator.received().is_empty());
}

#[tokio::test]
async fn request_with_correct_credentials_is_relayed() {
    let app = spawn_gated().await;

    let response = app
        .client
        .post(app.info_url())
        .basic_auth("u", Some("p"))
        .multipart(image_form(TEST_IMAGE))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, label_response());
    assert_eq!(app.annotator.received().len(), 1);
}

#[tokio::test]
async fn health_is_not_gated() {
    let app = spawn_gated().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn without_gate_requests_pass_unchecked() {
    let app = TestApp::spawn(MockAnnotationService::with_response(label_response())).await;

    let response = app.post_image(TEST_IMAGE).await;

    assert_eq!(response.status(), StatusCode::OK);
}
