//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::handlers;
use crate::services::OllamaClient;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use service_core::error::AppError;
use service_core::middleware::tracing::{http_trace_layer, request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Shared application state. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub ollama: OllamaClient,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, AppError> {
        let ollama = OllamaClient::new(&config.ollama)?;
        Ok(Self {
            config: Arc::new(config),
            ollama,
        })
    }
}

/// All HTTP routes of the relay.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/api/check-model", get(handlers::models::check_model))
        .route("/api/models", get(handlers::models::list_models))
        .route("/api/chat", post(handlers::chat::chat))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let state = AppState::new(config)?;

        tracing::info!(
            ollama = %state.ollama.base_url(),
            vision_model = %state.config.models.vision_model,
            text_model = %state.config.models.text_model,
            "Initialized Ollama client"
        );

        // Bind HTTP listener (port 0 = random port for testing)
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Chat relay: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, router(self.state)).await
    }

    /// Run until `shutdown` resolves, letting in-flight requests finish.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Log a warning for every configured model Ollama does not have installed.
pub async fn report_model_availability(state: &AppState) {
    let models = &state.config.models;
    for (kind, model) in [("vision", &models.vision_model), ("text", &models.text_model)] {
        match state.ollama.has_model(model).await {
            Ok(true) => tracing::info!(kind, model = %model, "Model is available"),
            Ok(false) => tracing::warn!(kind, model = %model, "Model not found on Ollama server"),
            Err(e) => {
                tracing::warn!(kind, model = %model, error = %e, "Could not check model availability")
            }
        }
    }
}
