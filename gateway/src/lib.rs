//! # dockapi
//!
//! File: gateway/src/lib.rs
//!
//! ## Overview
//!
//! A REST gateway in front of a Docker-compatible container engine. Inbound
//! HTTP requests are authenticated, dispatched to the engine through a
//! deadline-bounded adapter call, and every failure is classified into a
//! small HTTP error taxonomy.
//!
//! ## Architecture
//!
//! - **`core`**: Configuration and error types.
//! - **`common`**: Deadline scopes and the engine client adapter.
//! - **`api`**: Router, middleware, handlers, classifier and encoder.
//! - **`server`**: Listener and graceful shutdown.
//!
pub mod api;
pub mod common;
pub mod core;
pub mod server;
