use crate::config::HanaConfig;
use crate::handlers;
use crate::services::AnnotationService;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    basic_auth::{basic_auth_middleware, BasicAuthCredentials},
    metrics::metrics_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub annotator: Arc<dyn AnnotationService>,
}

impl AppState {
    pub fn new(annotator: Arc<dyn AnnotationService>) -> Self {
        Self { annotator }
    }
}

/// Routes plus the shared middleware stack.
///
/// The basic auth gate, when configured, guards the relay route only; health
/// and metrics stay open for probes and scrapers.
pub fn build_router(
    state: AppState,
    basic_auth: Option<BasicAuthCredentials>,
    max_upload_bytes: usize,
) -> Router {
    let mut relay = Router::new()
        .route("/hana/info", post(handlers::hana_info))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    if let Some(credentials) = basic_auth {
        tracing::info!(username = %credentials.username(), "Basic auth gate enabled");
        relay = relay.layer(from_fn_with_state(
            Arc::new(credentials),
            basic_auth_middleware,
        ));
    }

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .merge(relay)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(
        config: HanaConfig,
        annotator: Arc<dyn AnnotationService>,
    ) -> Result<Self, AppError> {
        let app = build_router(
            AppState::new(annotator),
            config.basic_auth.clone(),
            config.upload.max_bytes,
        );

        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
