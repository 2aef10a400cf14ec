//! # dockapi Engine Connection Helper
//!
//! File: gateway/src/common/engine/connect.rs
//!
//! ## Overview
//!
//! Builds the single, process-wide `bollard::Docker` handle from the configured
//! engine endpoint and verifies it answers before the listener is opened.
//!
//! Supported endpoint forms:
//! - `unix:///var/run/docker.sock` (`~` is expanded)
//! - `tcp://host:port` and `http://host:port`
//!
//! An empty endpoint falls back to the local default socket.
//!
//! Both steps are fatal on failure: `main` reports the error and exits.
//!
use crate::core::config::{expand_path, EngineConfig, DEFAULT_ENGINE_ENDPOINT};
use crate::core::error::{GatewayError, Result};
use anyhow::{anyhow, Context};
use bollard::{Docker, API_DEFAULT_VERSION};
use tracing::{info, instrument};

/// # Connect Engine (`connect_engine`)
///
/// Creates the engine client for `config.endpoint`.
///
/// Constructing the client does not open a connection; use `probe_engine` for that.
///
/// ## Arguments
///
/// * `config` - The endpoint (`unix://`, `tcp://` or `http://`; empty means
///   the default socket) and the client's transport timeout in seconds.
///
/// ## Returns
///
/// A `bollard::Docker` handle, cheap to clone and shared by every request.
///
/// ## Errors
///
/// Returns `GatewayError::UnsupportedEndpoint` for unknown schemes and
/// `GatewayError::DockerApi` if bollard rejects the endpoint.
#[instrument(skip(config), fields(endpoint = %config.endpoint))]
pub fn connect_engine(config: &EngineConfig) -> Result<Docker> {
    let endpoint = if config.endpoint.trim().is_empty() {
        info!(
            "Engine endpoint is not set, using default value {}",
            DEFAULT_ENGINE_ENDPOINT
        );
        DEFAULT_ENGINE_ENDPOINT
    } else {
        config.endpoint.trim()
    };

    if let Some(socket) = endpoint.strip_prefix("unix://") {
        return connect_unix(socket, config.timeout_secs)
            .with_context(|| format!("Failed to create engine client for {}", endpoint));
    }

    if endpoint.starts_with("tcp://") || endpoint.starts_with("http://") {
        return Docker::connect_with_http(endpoint, config.timeout_secs, API_DEFAULT_VERSION)
            .map_err(|e| anyhow!(GatewayError::DockerApi { source: e }))
            .with_context(|| format!("Failed to create engine client for {}", endpoint));
    }

    Err(anyhow!(GatewayError::UnsupportedEndpoint(endpoint.to_string())))
}

#[cfg(unix)]
fn connect_unix(socket: &str, timeout_secs: u64) -> Result<Docker> {
    let path = expand_path(socket)?;
    Docker::connect_with_unix(&path.to_string_lossy(), timeout_secs, API_DEFAULT_VERSION)
        .map_err(|e| anyhow!(GatewayError::DockerApi { source: e }))
}

#[cfg(not(unix))]
fn connect_unix(socket: &str, _timeout_secs: u64) -> Result<Docker> {
    Err(anyhow!(GatewayError::UnsupportedEndpoint(format!(
        "unix://{}",
        socket
    ))))
}

/// Pings the engine once.
///
/// # Errors
///
/// Returns an error when the engine cannot be reached or does not answer.
#[instrument(skip(docker))]
pub async fn probe_engine(docker: &Docker) -> Result<()> {
    docker
        .ping()
        .await
        .map_err(|e| anyhow!(GatewayError::DockerApi { source: e }))
        .context("Failed to reach the container engine. Is it running and accessible?")?;
    info!("Container engine answered ping.");
    Ok(())
}
