//! Router assembly and the HTTP server loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::routes;
use crate::config::AppConfig;
use crate::downloader::MediaExtractor;
use crate::relay::StreamRelay;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<StreamRelay>,
}

impl AppState {
    pub fn new(relay: StreamRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

fn endpoints() -> Router<AppState> {
    Router::new()
        .route("/download", get(routes::download))
        .route("/download/audio", get(routes::download_audio))
        .route("/download/video", get(routes::download_video))
        .route("/video-details", get(routes::video_details))
}

/// Form page at `/`, endpoints at `/` and under `/api`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .merge(endpoints())
        .nest("/api", endpoints())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C. In-flight downloads are allowed to finish.
pub async fn run_server(
    config: AppConfig,
    extractor: Arc<dyn MediaExtractor>,
) -> Result<(), ServerError> {
    let addr = config.server.bind;
    let state = AppState::new(StreamRelay::new(extractor, config.relay));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
