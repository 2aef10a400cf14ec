//! # dockapi HTTP Layer (`api`)
//!
//! File: gateway/src/api/mod.rs
//!
//! ## Overview
//!
//! Everything between the socket and the engine adapter:
//!
//! - **`router`**: Route table, shared `AppState`, middleware ordering.
//! - **`middleware`**: JSON content type and the shared-secret gate.
//! - **`extract`**: Path, query and body extractors that reject with the
//!   JSON envelope.
//! - **`handlers`**: One function per route; decode, scope, dispatch, encode.
//! - **`classify`**: `EngineFailure` → `ApiError` mapping.
//! - **`response`**: The JSON envelope and binary attachment encoders.
//!
//! ## Request Lifecycle
//!
//! ```text
//! Received ─► Authenticated ─► Routed ─► Dispatched ─► Succeeded
//!    │                                       └────────► Classified
//!    └─► Rejected (401)
//! ```
//!
//! Each request is handled independently; the only shared state is the engine
//! handle, the deadline manager and the classifier, all immutable after
//! startup.
//!

pub mod classify;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
