//! # dockapi Server
//!
//! File: gateway/src/server.rs
//!
//! ## Overview
//!
//! Process-level wiring:
//!
//! 1. Build the engine client from `[engine]` and ping it. Either failure is
//!    fatal; the listener is never opened.
//! 2. Build the router (`build_app`) around the shared engine handle.
//! 3. Bind the TCP listener and serve until Ctrl+C or SIGTERM, letting
//!    in-flight requests finish.
//!
use crate::api::classify::Classifier;
use crate::api::middleware::AuthGate;
use crate::api::router::{create_router, mount, AppState};
use crate::common::deadline::DeadlinePolicy;
use crate::common::engine::connect::{connect_engine, probe_engine};
use crate::common::engine::docker::DockerEngine;
use crate::common::engine::Engine;
use crate::core::config::Config;
use crate::core::error::Result;
use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Builds the complete application for `config` around `engine`.
///
/// # Errors
///
/// Fails if the authentication header name is invalid.
pub fn build_app(config: &Config, engine: Arc<dyn Engine>) -> Result<Router> {
    let gate = AuthGate::from_config(&config.auth)?;
    if !gate.is_enabled() {
        warn!("No auth token configured; every request will be accepted.");
    }

    let state = AppState::new(
        engine,
        DeadlinePolicy::from_config(&config.deadlines),
        Classifier::new(config.deadlines.distinct_timeout_status),
    );
    Ok(mount(create_router(state, gate), &config.server.base_path))
}

/// # Run Server (`run_server`)
///
/// Connects to the engine, binds the listener and serves until shutdown.
///
/// ## Arguments
///
/// * `config` - The fully resolved configuration (file, environment, flags).
///
/// ## Errors
///
/// * The engine endpoint is unusable or does not answer a ping.
/// * The auth header name is invalid.
/// * The listener cannot be bound.
/// * The server fails while running.
pub async fn run_server(config: Config) -> Result<()> {
    // 1. One engine handle for the whole process, checked before we accept traffic.
    let docker = connect_engine(&config.engine)?;
    probe_engine(&docker).await?;
    let engine: Arc<dyn Engine> = Arc::new(DockerEngine::new(docker));

    // 2. Routes, middleware and shared state.
    let app = build_app(&config, engine)?;

    // 3. Bind and serve; in-flight requests finish on shutdown.
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind listener to {}", addr))?;
    info!(
        "dockapi listening on http://{}{}",
        addr, config.server.base_path
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutdown complete.");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_signal_creation() {
        let shutdown_future = shutdown_signal();
        drop(shutdown_future);
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_fatal() {
        let mut config = Config::default();
        config.engine.endpoint = "tcp://127.0.0.1:1".to_string();
        config.engine.timeout_secs = 1;
        let err = run_server(config)
            .await
            .expect_err("nothing listens on port 1");
        assert!(format!("{:#}", err).contains("Failed to reach the container engine"));
    }
}
