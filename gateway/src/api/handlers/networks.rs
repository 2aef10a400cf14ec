//! # dockapi Network Handlers
//!
//! File: gateway/src/api/handlers/networks.rs
//!
use crate::api::classify::{Operation, Verb};
use crate::api::handlers::finish;
use crate::api::response::payload;
use crate::api::router::AppState;
use crate::common::deadline::OperationClass;
use crate::common::engine::ResourceKind;
use axum::{extract::State, response::Response};

/// `GET /networks`
pub async fn list(State(state): State<AppState>) -> Response {
    let op = Operation::collection(ResourceKind::Network, Verb::List);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.list_networks(&scope).await;
    drop(scope);
    finish(&state, &op, outcome, |networks| payload(&networks))
}
