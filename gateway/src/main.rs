//! # dockapi Main Entry Point
//!
//! File: gateway/src/main.rs
//!
//! ## Overview
//!
//! Parses the command line, configures logging from the verbosity flags,
//! loads the configuration and runs the server. Any startup failure is
//! reported once and the process exits with status 1.
//!
//! ## Examples
//!
//! ```bash
//! # Defaults: 0.0.0.0:8080, /api/docker, local docker socket
//! dockapi
//!
//! # Explicit config file, remote engine, info logging
//! dockapi -v --config ./dockapi.toml --engine tcp://10.0.0.5:2375
//! ```
//!
use clap::Parser;
use dockapi::core::config::{load_config, GatewayArgs};
use dockapi::server::run_server;
use tracing_subscriber::{fmt, EnvFilter};

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "dockapi",
    about = "REST gateway for a Docker-compatible container engine",
    long_about = "Exposes container, image, network and volume operations of a Docker engine\n\
                  over authenticated HTTP/JSON with per-call deadlines.",
    version
)]
struct Cli {
    #[command(flatten)]
    args: GatewayArgs,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!(
        config = ?cli.args.config,
        verbose = cli.verbose,
        "Parsed CLI arguments"
    );

    let outcome = match load_config(&cli.args) {
        Ok(config) => run_server(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        tracing::error!("Gateway failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
