//! # dockapi Configuration System
//!
//! File: gateway/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads, merges and validates the gateway configuration. Settings
//! come from three places, in order of precedence:
//!
//! 1. Command-line flags (or their `DOCKAPI_*` environment variables)
//! 2. A TOML file: `--config <path>`, else `./dockapi.toml`, else the user
//!    config directory (`~/.config/dockapi/config.toml` on Linux)
//! 3. Default values defined in the code
//!
//! ## Examples
//!
//! Configuration file format:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! base_path = "/api/docker"
//!
//! [engine]
//! endpoint = "unix:///var/run/docker.sock"
//! timeout_secs = 120
//!
//! [auth]
//! header = "X-Auth-Token"
//! token = "s3cret"
//!
//! [deadlines]
//! default_secs = 5
//! export_secs = 50
//! logs_secs = 5
//! distinct_timeout_status = false
//! ```
//!
//! The configuration is loaded once at startup and handed to the components
//! that need it; nothing re-reads it while the server runs.
//!
use crate::core::error::{GatewayError, Result};
use anyhow::{anyhow, Context};
use clap::Args;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Name of the configuration file looked up in the working directory.
const LOCAL_CONFIG_FILENAME: &str = "dockapi.toml";

/// The engine socket used when nothing else is configured.
pub const DEFAULT_ENGINE_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// # Gateway Arguments (`GatewayArgs`)
///
/// Command-line overrides for the configuration file. Every flag can also be
/// supplied through the environment variable named next to it.
#[derive(Args, Debug, Clone, Default)]
pub struct GatewayArgs {
    /// Path to a TOML configuration file.
    #[arg(long, short = 'c', env = "DOCKAPI_CONFIG")]
    pub config: Option<String>,

    /// IP address to bind the HTTP listener to.
    #[arg(long, env = "DOCKAPI_HOST")]
    pub host: Option<IpAddr>,

    /// TCP port to listen on.
    #[arg(long, short, env = "DOCKAPI_PORT")]
    pub port: Option<u16>,

    /// Engine control-socket address (unix://, tcp:// or http://).
    #[arg(long, env = "DOCKAPI_ENGINE")]
    pub engine: Option<String>,

    /// Prefix under which all routes are mounted.
    #[arg(long, env = "DOCKAPI_BASE_PATH")]
    pub base_path: Option<String>,

    /// Shared secret expected in the authentication header.
    #[arg(long, env = "DOCKAPI_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,
}

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub deadlines: DeadlineConfig,
}

/// Listener settings.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix for every route; empty mounts the routes at the root.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

/// Engine connection settings.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,
    /// Transport-level timeout of the engine client, independent of deadline scopes.
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

/// Shared-secret authentication settings.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default = "default_auth_header")]
    pub header: String,
    /// When `None` the authentication gate lets every request through.
    #[serde(default)]
    pub token: Option<String>,
}

/// Per-operation-class ceilings for deadline scopes.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeadlineConfig {
    #[serde(default = "default_short_deadline")]
    pub default_secs: u64,
    #[serde(default = "default_export_deadline")]
    pub export_secs: u64,
    #[serde(default = "default_short_deadline")]
    pub logs_secs: u64,
    /// Report deadline expiry as 504 instead of folding it into 500.
    #[serde(default)]
    pub distinct_timeout_status: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_port() -> u16 {
    8080
}
fn default_base_path() -> String {
    "/api/docker".to_string()
}
fn default_engine_endpoint() -> String {
    DEFAULT_ENGINE_ENDPOINT.to_string()
}
fn default_engine_timeout() -> u64 {
    120
}
fn default_auth_header() -> String {
    "X-Auth-Token".to_string()
}
fn default_short_deadline() -> u64 {
    5
}
fn default_export_deadline() -> u64 {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: default_base_path(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_engine_endpoint(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: default_auth_header(),
            token: None,
        }
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            default_secs: default_short_deadline(),
            export_secs: default_export_deadline(),
            logs_secs: default_short_deadline(),
            distinct_timeout_status: false,
        }
    }
}

impl Config {
    /// Applies command-line overrides on top of file/default values.
    pub fn apply_args(&mut self, args: &GatewayArgs) {
        if let Some(host) = args.host {
            self.server.host = host;
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(base_path) = &args.base_path {
            self.server.base_path = base_path.clone();
        }
        if let Some(engine) = &args.engine {
            self.engine.endpoint = engine.clone();
        }
        if let Some(token) = &args.auth_token {
            self.auth.token = Some(token.clone());
        }
    }
}

/// # Load Configuration (`load_config`)
///
/// Resolves the configuration file (if any), parses it, applies command-line
/// overrides and validates the result.
///
/// ## Errors
///
/// Returns an error if an explicitly requested file does not exist, if a file
/// cannot be read or parsed, or if the merged configuration is invalid.
pub fn load_config(args: &GatewayArgs) -> Result<Config> {
    // 1. File values, or defaults when no file is found.
    let mut config = match resolve_config_path(args.config.as_deref())? {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(&path)?
        }
        None => {
            debug!("No configuration file found, using defaults.");
            Config::default()
        }
    };

    // 2. Flags and their environment variables win over the file.
    config.apply_args(args);

    // 3. Reject combinations the server cannot start with.
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

/// Lookup order: `--config`, then `./dockapi.toml`, then the user config dir.
fn resolve_config_path(explicit: Option<&str>) -> Result<Option<PathBuf>> {
    // An explicit path must exist; the implicit locations are optional.
    if let Some(raw) = explicit {
        let path = expand_path(raw)?;
        if !path.is_file() {
            return Err(anyhow!(GatewayError::Config(format!(
                "Config file not found: {}",
                path.display()
            ))));
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILENAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "dockapi", "dockapi") {
        let user_path = proj_dirs.config_dir().join("config.toml");
        if user_path.is_file() {
            return Ok(Some(user_path));
        }
        debug!("User configuration file not found at {}", user_path.display());
    }

    Ok(None)
}

/// Reads and parses one TOML configuration file.
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Expands `~` and environment variables in a path-like string.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| anyhow!(GatewayError::Config(format!("Failed to expand '{}': {}", raw, e))))
}

fn validate_config(config: &Config) -> Result<()> {
    if config.auth.header.trim().is_empty() {
        return Err(anyhow!(GatewayError::Config(
            "auth.header must not be empty".to_string()
        )));
    }
    if config.auth.token.as_deref().is_some_and(str::is_empty) {
        return Err(anyhow!(GatewayError::Config(
            "auth.token must not be empty when set".to_string()
        )));
    }

    let deadlines = &config.deadlines;
    for (name, value) in [
        ("deadlines.default_secs", deadlines.default_secs),
        ("deadlines.export_secs", deadlines.export_secs),
        ("deadlines.logs_secs", deadlines.logs_secs),
    ] {
        if value == 0 {
            return Err(anyhow!(GatewayError::Config(format!(
                "{} must be greater than zero",
                name
            ))));
        }
    }

    let base = &config.server.base_path;
    if !base.is_empty() && !base.starts_with('/') {
        return Err(anyhow!(GatewayError::Config(format!(
            "server.base_path must start with '/', got '{}'",
            base
        ))));
    }

    if config.engine.endpoint.trim().is_empty() {
        return Err(anyhow!(GatewayError::Config(
            "engine.endpoint must not be empty".to_string()
        )));
    }

    Ok(())
}
