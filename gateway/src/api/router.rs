//! # dockapi Router
//!
//! File: gateway/src/api/router.rs
//!
//! ## Overview
//!
//! Builds the `axum::Router` for the gateway: the route table, the shared
//! `AppState` and the middleware stack.
//!
//! ## Architecture
//!
//! Layers, outermost first:
//!
//! 1. `redact_auth_header`: marks the auth header sensitive.
//! 2. `TraceLayer`: one INFO span per request/response, headers included.
//! 3. `json_content_type`: JSON content type unless the handler set one.
//! 4. `require_token`: the shared-secret gate. Rejections never reach routing.
//!
//! Unknown paths answer 404 and known paths with the wrong method answer 405,
//! both with the JSON envelope. Both sit behind the gate as well.
//!
//! ## Examples
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use dockapi::api::{classify::Classifier, middleware::AuthGate, router::{create_router, AppState}};
//! # use dockapi::common::{deadline::DeadlinePolicy, engine::{docker::DockerEngine, Engine}};
//! # fn demo(docker: bollard::Docker) -> anyhow::Result<()> {
//! let engine: Arc<dyn Engine> = Arc::new(DockerEngine::new(docker));
//! let state = AppState::new(engine, DeadlinePolicy::default(), Classifier::default());
//! let gate = AuthGate::new("X-Auth-Token", Some("s3cret"))?;
//! let app = create_router(state, gate);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```
//!
use crate::api::classify::Classifier;
use crate::api::handlers::{self, containers, images, networks, system, volumes};
use crate::api::middleware::{json_content_type, redact_auth_header, require_token, AuthGate};
use crate::api::response::status_only;
use crate::common::deadline::{DeadlineManager, DeadlinePolicy};
use crate::common::engine::Engine;
use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// State shared by every handler. Cheap to clone; immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn Engine>,
    pub deadlines: DeadlineManager,
    pub classifier: Classifier,
}

impl AppState {
    pub fn new(engine: Arc<dyn Engine>, policy: DeadlinePolicy, classifier: Classifier) -> Self {
        Self {
            engine,
            deadlines: DeadlineManager::new(policy),
            classifier,
        }
    }
}

/// Route table and middleware, with routes at the root (`/containers`, ...).
pub fn create_router(state: AppState, gate: AuthGate) -> Router {
    let redact = redact_auth_header(&gate);
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/info", get(system::info))
        .merge(container_routes())
        .merge(image_routes())
        .route("/networks", get(networks::list))
        .route("/volumes", get(volumes::list))
        .fallback(|| async { status_only(StatusCode::NOT_FOUND) })
        .method_not_allowed_fallback(|| async { status_only(StatusCode::METHOD_NOT_ALLOWED) })
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(redact)
                .layer(trace_layer)
                .layer(json_content_type())
                .layer(middleware::from_fn_with_state(gate, require_token)),
        )
}

/// Nests `router` under `base_path`. An empty or `/` base path mounts at the root.
pub fn mount(router: Router, base_path: &str) -> Router {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        router
    } else {
        Router::new()
            .nest(base, router)
            .fallback(|| async { status_only(StatusCode::NOT_FOUND) })
    }
}

fn container_routes() -> Router<AppState> {
    Router::new()
        .route("/containers", get(containers::list).post(containers::create))
        .route("/containers/prune", post(containers::prune))
        .route(
            "/containers/{id}",
            get(containers::inspect).delete(containers::remove),
        )
        .route("/containers/{id}/logs", get(containers::logs))
        .route("/containers/{id}/start", get(containers::start))
        .route("/containers/{id}/stop", get(containers::stop))
        .route("/containers/{id}/restart", get(containers::restart))
        .route("/containers/{id}/pause", get(containers::pause))
        .route("/containers/{id}/unpause", get(containers::unpause))
        .route("/containers/{id}/kill", get(containers::kill))
        .route("/containers/{id}/export", get(containers::export))
        .route("/containers/{id}/top", get(containers::top))
        .route("/containers/{id}/wait", get(containers::wait))
        .route("/containers/{id}/rename", post(containers::rename))
        .route("/containers/{id}/update", post(containers::update))
        .route("/containers/{id}/resize", post(containers::resize))
}

fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/images", get(images::list))
        .route("/images/search", get(images::search))
        .route("/images/searchEx", get(handlers::not_implemented))
        .route("/images/export", get(images::export_many))
        .route("/images/prune", post(handlers::not_implemented))
        .route("/images/{id}", get(images::inspect).delete(images::remove))
        .route("/images/{id}/history", get(images::history))
        .route("/images/{id}/export", get(images::export))
        .route("/images/{id}/tag", post(images::tag))
        .route("/images/{id}/extended", delete(images::remove_extended))
        .route("/images/{id}/push", post(handlers::not_implemented))
        .route("/images/{id}/pull", post(handlers::not_implemented))
        .route("/images/{id}/load", post(handlers::not_implemented))
        .route("/images/{id}/import", get(handlers::not_implemented))
        .route("/images/{id}/build", get(handlers::not_implemented))
}
