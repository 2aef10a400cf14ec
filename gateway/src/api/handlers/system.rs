//! # dockapi System Handlers
//!
//! File: gateway/src/api/handlers/system.rs
//!
//! Engine-wide information. The operation is not addressed to a resource, so
//! any failure is classified as internal.
//!
use crate::api::classify::{Operation, Verb};
use crate::api::handlers::finish;
use crate::api::response::payload;
use crate::api::router::AppState;
use crate::common::deadline::OperationClass;
use crate::common::engine::ResourceKind;
use axum::{extract::State, response::Response};

/// `GET /info`
pub async fn info(State(state): State<AppState>) -> Response {
    // Not resource-addressed; the kind only labels the log line.
    let op = Operation::collection(ResourceKind::Container, Verb::Info);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.info(&scope).await;
    drop(scope);
    finish(&state, &op, outcome, |info| payload(&info))
}
