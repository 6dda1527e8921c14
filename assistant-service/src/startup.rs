//! Application startup and lifecycle management.

use crate::config::AssistantConfig;
use crate::handlers;
use crate::services::assistants::openai::{OpenAiConfig, OpenAiThreadService};
use crate::services::assistants::ThreadService;
use crate::services::quota::{quota_from_config, QuotaGate};
use crate::services::{ConversationManager, SessionStore};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AssistantConfig,
    pub store: SessionStore,
    pub manager: Arc<ConversationManager>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against the real assistants backend.
    pub async fn build(config: AssistantConfig) -> Result<Self, AppError> {
        let service: Arc<dyn ThreadService> = Arc::new(OpenAiThreadService::new(OpenAiConfig {
            api_key: config.api.api_key.clone(),
            base_url: config.api.base_url.clone(),
        }));

        tracing::info!(
            base_url = %config.api.base_url,
            assistant_id = %config.api.assistant_id,
            "Initialized assistants client"
        );

        let quota = quota_from_config(&config.quota);

        Self::build_with(config, service, quota).await
    }

    /// Build the application with an injected thread service and quota gate.
    pub async fn build_with(
        config: AssistantConfig,
        service: Arc<dyn ThreadService>,
        quota: Arc<dyn QuotaGate>,
    ) -> Result<Self, AppError> {
        let store = SessionStore::new();
        let manager = Arc::new(ConversationManager::new(
            service,
            store.clone(),
            quota,
            config.api.assistant_id.clone(),
            config.run.poll_interval(),
            config.run.timeout(),
        ));

        let state = AppState {
            config: config.clone(),
            store,
            manager,
        };

        // Bind listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> &SessionStore {
        &self.state.store
    }

    /// Run the application until stopped or a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        // Multipart bodies carry some framing overhead beyond the file cap.
        let body_limit = self.state.config.limits.max_upload_bytes as usize + 64 * 1024;

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/sessions", post(handlers::create_session))
            .route(
                "/sessions/:session_id",
                get(handlers::get_session).delete(handlers::delete_session),
            )
            .route(
                "/sessions/:session_id/messages",
                post(handlers::post_message),
            )
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state);

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
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
