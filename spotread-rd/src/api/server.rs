//! HTTP server setup and routing
//!
//! Sets up the Axum router with routes for library access, playback
//! control, and the SSE event stream.

use crate::error::{Error, Result};
use crate::spotlight::SpotlightEngine;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use spotread_common::params::PlaybackParams;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone, which gives us `FromRef<AppContext>` for
/// free via Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub engine: Arc<SpotlightEngine>,
    pub params: Arc<PlaybackParams>,
    pub library_root: PathBuf,
}

/// Build the application router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Library
        .route("/books", get(super::handlers::list_books))
        .route("/books/:book_id/open", post(super::handlers::open_book))
        // Playback control
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/pause", post(super::handlers::pause))
        .route("/playback/next", post(super::handlers::next_paragraph))
        .route("/playback/previous", post(super::handlers::previous_paragraph))
        .route("/playback/chapter/next", post(super::handlers::next_chapter))
        .route("/playback/chapter/previous", post(super::handlers::previous_chapter))
        .route("/playback/seek", post(super::handlers::seek))
        .route("/playback/state", get(super::handlers::get_playback_state))
        .route("/playback/position", get(super::handlers::get_position))
        .route("/playback/tempo", get(super::handlers::get_tempo))
        .route("/playback/tempo", post(super::handlers::set_tempo))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP API server
pub async fn run(port: u16, ctx: AppContext) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
