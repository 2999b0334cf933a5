#![allow(dead_code)]

use hana_service::config::{GoogleConfig, HanaConfig, UploadConfig};
use hana_service::services::MockAnnotationService;
use hana_service::startup::Application;
use reqwest::multipart;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use service_core::middleware::basic_auth::BasicAuthCredentials;
use std::sync::Arc;

pub const TEST_IMAGE: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR fake image bytes";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub annotator: Arc<MockAnnotationService>,
}

impl TestApp {
    pub async fn spawn(annotator: MockAnnotationService) -> Self {
        Self::spawn_with(annotator, None, 1024 * 1024).await
    }

    pub async fn spawn_with(
        annotator: MockAnnotationService,
        basic_auth: Option<BasicAuthCredentials>,
        max_upload_bytes: usize,
    ) -> Self {
        let annotator = Arc::new(annotator);
        let config = test_config(basic_auth, max_upload_bytes);

        let app = Application::build(config, annotator.clone())
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: reqwest::Client::new(),
            annotator,
        }
    }

    pub fn info_url(&self) -> String {
        format!("{}/hana/info", self.address)
    }

    pub async fn post_image(&self, bytes: &[u8]) -> reqwest::Response {
        self.client
            .post(self.info_url())
            .multipart(image_form(bytes))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn test_config(basic_auth: Option<BasicAuthCredentials>, max_upload_bytes: usize) -> HanaConfig {
    HanaConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
            ..CoreConfig::default()
        },
        google: GoogleConfig {
            credentials_path: "tests/fixtures/service_account.json".to_string(),
            vision_endpoint: "http://127.0.0.1:9/v1".to_string(),
            request_timeout_secs: 5,
        },
        upload: UploadConfig {
            max_bytes: max_upload_bytes,
        },
        basic_auth,
    }
}

pub fn image_form(bytes: &[u8]) -> multipart::Form {
    multipart::Form::new().part(
        "image",
        multipart::Part::bytes(bytes.to_vec())
            .file_name("cat.png")
            .mime_str("image/png")
            .unwrap(),
    )
}

pub fn label_response() -> Value {
    json!({
        "labelAnnotations": [
            { "mid": "/m/01yrx", "description": "Cat", "score": 0.98, "topicality": 0.98 },
            { "mid": "/m/04rky", "description": "Mammal", "score": 0.93, "topicality": 0.93 }
        ]
    })
}
