pub mod docs;
pub mod hello;
pub mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Router, serve};
use cluster_secrets::SecretStore;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::storage::{ArtifactRegistry, ObjectUploader, OrasPusher, S3Uploader};

/// Body of every successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<GatewayConfig>,
    pub secrets: Arc<dyn SecretStore>,
    pub objects: Arc<dyn ObjectUploader>,
    pub registry: Option<Arc<dyn ArtifactRegistry>>,
}

impl ServerState {
    /// Wires the production backends described by `config`.
    pub async fn from_config(config: GatewayConfig) -> Result<Self> {
        let secrets = cluster_secrets::init(config.secrets_backend, config.pod_namespace.clone())
            .await
            .context("failed to initialise secrets backend")?;
        let registry = config.registry.as_ref().map(|settings| {
            tracing::info!(
                registry = %settings.host,
                repository = %settings.repository,
                plain_http = settings.plain_http,
                authenticated = settings.username.is_some() && settings.password.is_some(),
                "artifact registry configured"
            );
            Arc::new(OrasPusher::new(settings)) as Arc<dyn ArtifactRegistry>
        });
        if registry.is_none() {
            tracing::warn!("REGISTRY is not set; /upload-oras will be unavailable");
        }
        Ok(Self {
            config: Arc::new(config),
            secrets,
            objects: Arc::new(S3Uploader::new()),
            registry,
        })
    }
}

pub fn router(state: ServerState) -> Router {
    let swagger = ServeDir::new(&state.config.swagger_dir);
    Router::new()
        .route("/hello", get(hello::handler))
        .route("/upload-s3", post(upload::upload_s3))
        .route("/upload-oras", post(upload::upload_oras))
        .route("/openapi.yaml", get(docs::openapi))
        .nest_service("/swagger", swagger)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct GatewayServer {
    addr: SocketAddr,
    router: Router,
}

impl GatewayServer {
    pub fn new(state: ServerState) -> Self {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
        Self {
            addr,
            router: router(state),
        }
    }

    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!(addr = %self.addr, "starting upload gateway");
        serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("upload gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("received shutdown signal");
}
