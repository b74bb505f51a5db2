//! # student-api
//!
//! Minimal REST API for student records (create, list, update, delete) plus an
//! aggregate mark statistics endpoint, meant to back a small admin dashboard.
//!
//! ## Architecture
//!
//! - **Store**: id-keyed student records behind a shared handle, optionally
//!   snapshotted to a JSON file after every mutation
//! - **Stats**: count, average, min and max over stored marks
//! - **HTTP**: Axum router with permissive CORS, request IDs, tracing, and graceful
//!   shutdown. Every error is a 404 carrying `{"error": <message>}`

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod config;
mod http;
mod stats;
mod store;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Cli};
use crate::http::{router, AppState};
use crate::store::StudentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        data_file = ?config.data_file.as_ref().map(|path| path.display().to_string()),
        "configuration loaded"
    );

    let store = match config.data_file.clone() {
        Some(path) => StudentStore::open(path.clone())
            .await
            .with_context(|| format!("failed to open data file {}", path.display()))?,
        None => StudentStore::in_memory(),
    };
    info!(
        students = store.len().await,
        persistent = store.data_file().is_some(),
        "student store ready"
    );

    let app = router(AppState::new(store));
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    if config.bind.ip().is_loopback() {
        tracing::warn!(
            bind = %config.bind,
            "binding to loopback; use --bind 0.0.0.0:5000 for LAN access"
        );
    }

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "student-api listening");

    serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
