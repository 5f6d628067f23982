//! Reader Daemon (spotread-rd) - Main entry point
//!
//! Hosts the spotlight playback engine and its HTTP/SSE control interface
//! over a local library of imported books.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use spotread_common::config::resolve_library_folder;
use spotread_common::params::PlaybackParams;
use spotread_rd::api::{self, AppContext};
use spotread_rd::spotlight::SpotlightEngine;
use spotread_rd::SharedState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for spotread-rd
#[derive(Parser, Debug)]
#[command(name = "spotread-rd")]
#[command(about = "Reader daemon for SpotRead")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "SPOTREAD_RD_PORT")]
    port: u16,

    /// Library folder containing imported books
    #[arg(short, long, env = "SPOTREAD_LIBRARY")]
    library: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spotread_rd=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let library_root = {
        let cli = args.library.as_ref().map(|p| p.to_string_lossy().into_owned());
        resolve_library_folder(cli.as_deref(), "SPOTREAD_LIBRARY")
            .context("Failed to resolve library folder")?
    };

    info!("Starting SpotRead reader daemon on port {}", args.port);
    info!("Library folder: {}", library_root.display());

    let state = Arc::new(SharedState::new());
    let params = Arc::new(PlaybackParams::new());
    let engine = Arc::new(SpotlightEngine::start(Arc::clone(&state), Arc::clone(&params)));

    let ctx = AppContext {
        state,
        engine,
        params,
        library_root,
    };

    api::server::run(args.port, ctx)
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
