//! # dockapi Container Handlers
//!
//! File: gateway/src/api/handlers/containers.rs
//!
//! ## Overview
//!
//! Routes under `/containers`:
//!
//! | Method | Path | Result |
//! |---|---|---|
//! | GET | `/containers` | all containers, stopped ones included |
//! | POST | `/containers` | create, then start; returns the create record |
//! | POST | `/containers/prune` | prune report |
//! | GET / DELETE | `/containers/{id}` | inspect / remove |
//! | GET | `/containers/{id}/{start,stop,restart,kill,pause,unpause}` | state change |
//! | GET | `/containers/{id}/logs` | JSON array of log lines |
//! | GET | `/containers/{id}/export` | filesystem tarball attachment |
//! | GET | `/containers/{id}/{top,wait}` | process list / exit record |
//! | POST | `/containers/{id}/{rename,update,resize}` | body-driven changes |
//!
use super::{finish, reject, split_log_lines};
use crate::api::classify::{Operation, Verb};
use crate::api::extract::{JsonBody, ResourceId};
use crate::api::response::{attachment, message, payload, tar_filename};
use crate::api::router::AppState;
use crate::common::deadline::OperationClass;
use crate::common::engine::{
    CreateContainerRequest, RenameContainerRequest, ResizeTtyRequest, ResourceKind,
    UpdateContainerRequest,
};
use axum::{extract::State, response::Response};
use tracing::debug;

const KIND: ResourceKind = ResourceKind::Container;

pub async fn list(State(state): State<AppState>) -> Response {
    let op = Operation::collection(KIND, Verb::List);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.list_containers(&scope).await;
    drop(scope);
    finish(&state, &op, outcome, |containers| payload(&containers))
}

/// # Create Container (`create`)
///
/// Creates a container from the request body and starts it.
///
/// ## Arguments
///
/// * `state` - Shared engine handle, deadline manager and classifier.
/// * `request` - The decoded `CreateContainerRequest`. An undecodable body is
///   rejected by `JsonBody` before this function runs.
///
/// ## Returns
///
/// * `200` with the engine's create record (`Id`, `Warnings`) once the
///   container has been created *and* started.
/// * The classified failure of whichever call failed. A failed start leaves
///   the created container in place.
pub async fn create(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateContainerRequest>,
) -> Response {
    // A requested name is the identity a duplicate-name conflict is matched against.
    let op = match request.name.as_deref() {
        Some(name) => Operation::on(KIND, Verb::Create, name),
        None => Operation::collection(KIND, Verb::Create),
    };

    // 1. Create, in its own scope.
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.create_container(&scope, &request).await;
    drop(scope);
    let created = match outcome {
        Ok(created) => created,
        Err(failure) => return reject(&op, state.classifier.classify(&op, &failure)),
    };
    debug!(id = %created.id, image = %request.config.image, "Container created, starting it");

    // 2. Start the new container by id, in a second scope.
    let start_op = Operation::on(KIND, Verb::Start, &created.id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.start_container(&scope, &created.id).await;
    drop(scope);

    // 3. Report the create record, not the (empty) start result.
    finish(&state, &start_op, outcome, move |()| payload(&created))
}

pub async fn inspect(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Inspect, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.inspect_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |details| payload(&details))
}

pub async fn remove(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Remove, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.remove_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container deleted"))
}

pub async fn start(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Start, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.start_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container started"))
}

pub async fn stop(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Stop, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.stop_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container stopped"))
}

pub async fn restart(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Restart, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.restart_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container restarted"))
}

pub async fn kill(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Kill, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.kill_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container killed"))
}

pub async fn pause(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Pause, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.pause_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container paused"))
}

pub async fn unpause(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Unpause, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.unpause_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container unpaused"))
}

/// Returns the complete log buffer as a JSON array of non-empty lines.
///
/// Both streams are included, each line prefixed with its engine timestamp.
/// There is no `follow` mode: the call ends when the buffer is drained.
pub async fn logs(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Logs, &id);
    // The drain of the whole buffer counts against the scope.
    let scope = state.deadlines.open(OperationClass::Logs);
    let outcome = state.engine.container_logs(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |raw| payload(&split_log_lines(&raw)))
}

/// # Export Container (`export`)
///
/// Returns the container filesystem as a tarball attachment named after the
/// id (`web.tar`). The whole archive is buffered under the `Export` ceiling.
pub async fn export(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Export, &id);
    let scope = state.deadlines.open(OperationClass::Export);
    let outcome = state.engine.export_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |bytes| attachment(&tar_filename(&id), bytes))
}

pub async fn top(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Top, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.top_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |processes| payload(&processes))
}

pub async fn wait(State(state): State<AppState>, ResourceId(id): ResourceId) -> Response {
    let op = Operation::on(KIND, Verb::Wait, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.wait_container(&scope, &id).await;
    drop(scope);
    finish(&state, &op, outcome, |exit| payload(&exit))
}

/// `POST /containers/{id}/rename` with `{"Name": "new-name"}`.
pub async fn rename(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    JsonBody(request): JsonBody<RenameContainerRequest>,
) -> Response {
    let op = Operation::on(KIND, Verb::Rename, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.rename_container(&scope, &id, &request.name).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container renamed"))
}

/// `POST /containers/{id}/update` with resource limits.
///
/// Only the limits present in the body are sent; absent ones stay unchanged.
pub async fn update(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    JsonBody(request): JsonBody<UpdateContainerRequest>,
) -> Response {
    let op = Operation::on(KIND, Verb::Update, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.update_container(&scope, &id, &request).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container updated"))
}

pub async fn resize(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    JsonBody(size): JsonBody<ResizeTtyRequest>,
) -> Response {
    let op = Operation::on(KIND, Verb::Resize, &id);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.resize_container_tty(&scope, &id, size).await;
    drop(scope);
    finish(&state, &op, outcome, |()| message("Container resized"))
}

/// Removes every stopped container and returns the engine's prune report.
pub async fn prune(State(state): State<AppState>) -> Response {
    let op = Operation::collection(KIND, Verb::Prune);
    let scope = state.deadlines.open(OperationClass::Control);
    let outcome = state.engine.prune_containers(&scope).await;
    drop(scope);
    finish(&state, &op, outcome, |report| payload(&report))
}
