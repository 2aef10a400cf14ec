//! # dockapi Dispatch Handlers
//!
//! File: gateway/src/api/handlers/mod.rs
//!
//! ## Overview
//!
//! One async function per route, grouped by resource kind. Every handler
//! follows the same shape:
//!
//! 1. Decode path, query and body through the `api::extract` wrappers.
//!    Undecodable input is rejected with a 400 envelope before any deadline
//!    scope is opened.
//! 2. Open exactly one `DeadlineScope` for the operation class.
//! 3. Make one adapter call inside that scope.
//! 4. Release the scope, then encode the success value or classify the
//!    failure.
//!
//! The scope is a local value, so it is also released on early return,
//! cancellation (the client went away) and unwinding.
//!
//! ## Architecture
//!
//! - **`containers`**: Container lifecycle, logs, export and housekeeping.
//! - **`images`**: Image listing, inspection, tagging, removal, export, stubs.
//! - **`networks`** / **`volumes`**: Read-only listings.
//! - **`system`**: Engine information.
//!
use crate::api::classify::Operation;
use crate::api::router::AppState;
use crate::common::engine::EngineResult;
use crate::core::error::ApiError;
use axum::body::Bytes;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

pub mod containers;
pub mod images;
pub mod networks;
pub mod system;
pub mod volumes;

/// Decodes a JSON request body.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` when the body is empty or not valid JSON
/// for `T`.
pub fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

/// # Finish Dispatch (`finish`)
///
/// Turns one adapter outcome into the response. Call it only after the
/// operation's scope has been dropped.
///
/// ## Arguments
///
/// * `state` - Supplies the classifier.
/// * `operation` - What was attempted; a failure is classified against it.
/// * `outcome` - The adapter's result.
/// * `on_success` - Encodes the success value.
///
/// ## Returns
///
/// The encoded success value, or the classified failure envelope.
pub fn finish<T>(
    state: &AppState,
    operation: &Operation,
    outcome: EngineResult<T>,
    on_success: impl FnOnce(T) -> Response,
) -> Response {
    match outcome {
        Ok(value) => on_success(value),
        Err(failure) => reject(operation, state.classifier.classify(operation, &failure)),
    }
}

/// Logs a terminal failure once and encodes it.
///
/// Client mistakes log at `warn`; engine and gateway faults at `error`.
pub fn reject(operation: &Operation, err: ApiError) -> Response {
    let status = err.status_code();
    // One log line per failed request, carrying the operation identity.
    if status.is_server_error() {
        error!(
            kind = err.kind(),
            resource = %operation.kind,
            verb = ?operation.verb,
            id = operation.id.as_deref().unwrap_or("-"),
            "{}",
            err
        );
    } else {
        warn!(
            kind = err.kind(),
            resource = %operation.kind,
            verb = ?operation.verb,
            id = operation.id.as_deref().unwrap_or("-"),
            "{}",
            err
        );
    }
    err.into_response()
}

/// Handler for deliberately unsupported operations.
///
/// Takes no extractors, so it answers 501 whatever the request carries.
pub async fn not_implemented() -> Response {
    ApiError::Unimplemented.into_response()
}

/// Splits a buffered log stream into its non-empty lines.
pub fn split_log_lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
