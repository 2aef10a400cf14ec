//! # dockapi Image Handlers
//!
//! File: gateway/src/api/handlers/images.rs
//!
//! ## Overview
//!
//! Routes under `/images`. Push, pull, load, import, build, extended search
//! and image pruning are unsupported and routed to
//! `handlers::not_implemented` in the router; everything else dispatches to
//! the engine.
//!
//! Exports use the bulk `Export` deadline class and are returned as
//! `application/octet-stream` attachments.
//!
use super::{finish, reject};
use crate::api::classify::{Operation, Verb};
use crate::api::extract::{QueryArgs, ResourceId};
use crate::api::response::{attachment, message, payload, tar_filename};
use crate::api::router::AppState;
use crate::common::deadline::OperationClass;
use crate::common::engine::{RemoveImageRequest, ResourceKind, TagImageRequest};
use crate::core::error::ApiError;
use axum::{extract::State, response::Response};
use std::collections::HashMap;

const KIND: ResourceKind = ResourceKind::Image;

/// Reads a boolean query flag; only the literal `true` enables it.
fn flag(query: &HashMap<String, String>, name: &str) -> bool {
    query.get(name).is_some_and(|value| value == "true")
}

pub async fn list(State(state): State<AppState>) -> Response {
    let op = Operation::collection(KIND, Verb::List);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.list_images(&scope).await;
    drop(scope);
    finish(&state, &op, outcome, |images| payload(&images))
}

/// `GET /images/search?term=...`
pub async fn search(
    State(state): State<AppState>,
    QueryArgs(query): QueryArgs<HashMap<String, String>>,
) -> Response {
    let op = Operation::collection(KIND, Verb::Search);
    let Some(term) = query.get("term").filter(|term| !term.is_empty()) else {
        return reject(
            &op,
            ApiError::BadRequest("Missing query parameter: term".to_string()),
        );
    };
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.search_images(&scope, term).await;
    drop(scope);
    finish(&state, &op, outcome, |results| payload(&results))
}

pub async fn inspect(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Inspect, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.inspect_image(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |details| payload(&details))
}

pub async fn history(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::History, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.image_history(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |layers| payload(&layers))
}

/// `DELETE /images/{id}`: plain removal.
pub async fn remove(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    remove_with(state, id, RemoveImageRequest::default()).await
}

/// `DELETE /images/{id}/extended?force=true&noprune=true`
pub async fn remove_extended(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    QueryArgs(query): QueryArgs<HashMap<String, String>>,
) -> Response {
    let options = RemoveImageRequest {
        force: flag(&query, "force"),
        noprune: flag(&query, "noprune"),
    };
    remove_with(state, id, options).await
}

async fn remove_with(state: AppState, id: String, options: RemoveImageRequest) -> Response {
    let op = Operation::on(KIND, Verb::Remove, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.remove_image(&scope, &id, options).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Image removed"))
}

/// `POST /images/{id}/tag?repo=...&tag=...`
pub async fn tag(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    QueryArgs(query): QueryArgs<HashMap<String, String>>,
) -> Response {
    let op = Operation::on(KIND, Verb::Tag, &id);
    let Some(repo) = query.get("repo").filter(|repo| !repo.is_empty()) else {
        return reject(
            &op,
            ApiError::BadRequest("Missing query parameter: repo".to_string()),
        );
    };
    let request = TagImageRequest {
        repo: repo.clone(),
        tag: query.get("tag").cloned().unwrap_or_default(),
    };
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.tag_image(&scope, &id, &request).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Image tagged"))
}

/// `GET /images/{id}/export`: one image as `{reference}.tar`.
pub async fn export(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Export, &id);
    let scope = state.deadlines.open(OperationClass::Export);
    let outcome = state.engine.export_image(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |bytes| attachment(&tar_filename(&id), bytes))
}

/// # Bulk Image Export (`export_many`)
///
/// `GET /images/export?id=a&id=b`: several images in one `images.tar`.
///
/// ## Arguments
///
/// * `pairs` - The raw query pairs; every non-empty `id` is one reference,
///   in request order.
///
/// ## Errors
///
/// * `400` when no `id` is given. The engine is not called.
/// * `404` naming the image when exactly one `id` is given and it is unknown.
///   With several ids the engine does not say which one is missing, so the
///   failure stays unclassified.
pub async fn export_many(
    State(state): State<AppState>,
    QueryArgs(pairs): QueryArgs<Vec<(String, String)>>,
) -> Response {
    let ids: Vec<String> = pairs
        .into_iter()
        .filter(|(key, value)| key == "id" && !value.is_empty())
        .map(|(_, value)| value)
        .collect();
    let op = match ids.as_slice() {
        [single] => Operation::on(KIND, Verb::Export, single),
        _ => Operation::collection(KIND, Verb::Export),
    };
    if ids.is_empty() {
        return reject(
            &op,
            ApiError::BadRequest("Missing query parameter: id".to_string()),
        );
    }
    let scope = state.deadlines.open(OperationClass::Export);
    let outcome = state.engine.export_images(&scope, &ids).await;
    drop(scope);
    finish(&state, &op, outcome, |bytes| attachment("images.tar", bytes))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_requires_literal_true() {
        let mut query = HashMap::new();
        query.insert("force".to_string(), "true".to_string());
        query.insert("noprune".to_string(), "1".to_string());
        assert!(flag(&query, "force"));
        assert!(!flag(&query, "noprune"));
        assert!(!flag(&query, "missing"));
    }
}
