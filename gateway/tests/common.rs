//! # dockapi Integration Test Common Helpers
//!
//! File: gateway/tests/common.rs
//!
//! ## Overview
//!
//! Shared pieces for the router-level integration tests:
//!
//! - `StubEngine`: an in-memory `Engine` with a handful of containers and
//!   images, an invocation counter, an optional artificial delay and an
//!   optional panic trigger. Its failures mirror the values `DockerEngine`
//!   produces for the same situations.
//! - `Harness`: the router wired to a `StubEngine`, plus helpers that drive it
//!   with `tower::ServiceExt::oneshot`.
//!

// Each test file uses a different subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use bollard::models::{
    ContainerCreateResponse, ContainerInspectResponse, ContainerPruneResponse, ContainerState,
    ContainerSummary, ContainerTopResponse, ContainerWaitResponse, HistoryResponseItem,
    ImageInspect, ImageSearchResponseItem, ImageSummary, Network, SystemInfo,
    VolumeListResponse,
};
use dockapi::api::classify::Classifier;
use dockapi::api::middleware::AuthGate;
use dockapi::api::router::{create_router, AppState};
use dockapi::common::deadline::{DeadlineManager, DeadlineScope, DeadlinePolicy};
use dockapi::common::engine::{
    CreateContainerRequest, Engine, EngineFailure, EngineResult, RemoveImageRequest,
    ResizeTtyRequest, TagImageRequest, UpdateContainerRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const TOKEN_HEADER: &str = "X-Auth-Token";
pub const TOKEN: &str = "test-token";

/// Tarball bytes returned by every export.
pub const EXPORT_BYTES: &[u8] = b"\x00\x01fake-tar\xfe\xff";

/// Raw log buffer returned for every container.
pub const LOG_BYTES: &[u8] =
    b"2024-05-01T10:00:00.000000000Z booting\n\n2024-05-01T10:00:01.000000000Z ready\n";

/// Image references the stub knows about.
pub const KNOWN_IMAGE: &str = "nginx:alpine";

#[derive(Debug, Clone)]
struct StubContainer {
    id: String,
    name: Option<String>,
    image: String,
    running: bool,
    paused: bool,
}

/// In-memory `Engine` used by the integration tests.
#[derive(Debug, Default)]
pub struct StubEngine {
    containers: Mutex<Vec<StubContainer>>,
    next_id: AtomicUsize,
    calls: AtomicUsize,
    delay: Option<Duration>,
    panic_on: Option<String>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` inside its deadline scope.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Inspecting the container `id` panics inside the adapter.
    pub fn panicking_on(mut self, id: &str) -> Self {
        self.panic_on = Some(id.to_string());
        self
    }

    /// Adds a container directly, bypassing the call counter.
    pub fn seed(self, id: &str, name: &str, running: bool) -> Self {
        self.containers
            .lock()
            .expect("stub lock")
            .push(StubContainer {
                id: id.to_string(),
                name: Some(name.to_string()),
                image: KNOWN_IMAGE.to_string(),
                running,
                paused: false,
            });
        self
    }

    /// Number of adapter methods invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn pause_for_delay(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Applies `change` to the container addressed by `id` (id or name).
    fn with_container<T>(
        &self,
        id: &str,
        change: impl FnOnce(&mut StubContainer) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut containers = self.containers.lock().expect("stub lock");
        match containers
            .iter_mut()
            .find(|c| c.id == id || c.name.as_deref() == Some(id))
        {
            Some(container) => change(container),
            None => Err(EngineFailure::NoSuchContainer { id: id.to_string() }),
        }
    }

    fn known_image(id: &str) -> EngineResult<()> {
        if id == KNOWN_IMAGE || id == "nginx" {
            Ok(())
        } else {
            Err(EngineFailure::NoSuchImage { id: id.to_string() })
        }
    }
}

#[async_trait]
impl Engine for StubEngine {
    async fn info(&self, scope: &DeadlineScope) -> EngineResult<SystemInfo> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Ok(SystemInfo {
                    name: Some("stub-engine".to_string()),
                    ..Default::default()
                })
            })
            .await
    }

    async fn list_containers(&self, scope: &DeadlineScope) -> EngineResult<Vec<ContainerSummary>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                let containers = self.containers.lock().expect("stub lock");
                Ok(containers
                    .iter()
                    .map(|c| ContainerSummary {
                        id: Some(c.id.clone()),
                        names: c.name.as_ref().map(|n| vec![format!("/{}", n)]),
                        image: Some(c.image.clone()),
                        ..Default::default()
                    })
                    .collect())
            })
            .await
    }

    async fn create_container(
        &self,
        scope: &DeadlineScope,
        request: &CreateContainerRequest,
    ) -> EngineResult<ContainerCreateResponse> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Self::known_image(&request.config.image).map_err(|_| {
                    EngineFailure::NoSuchImage {
                        id: request.config.image.clone(),
                    }
                })?;
                let mut containers = self.containers.lock().expect("stub lock");
                if let Some(name) = request.name.as_deref() {
                    if containers.iter().any(|c| c.name.as_deref() == Some(name)) {
                        return Err(EngineFailure::ContainerAlreadyExists {
                            name: name.to_string(),
                        });
                    }
                }
                let id = format!("{:064x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                containers.push(StubContainer {
                    id: id.clone(),
                    name: request.name.clone(),
                    image: request.config.image.clone(),
                    running: false,
                    paused: false,
                });
                Ok(ContainerCreateResponse {
                    id,
                    warnings: Vec::new(),
                })
            })
            .await
    }

    async fn inspect_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerInspectResponse> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                if self.panic_on.as_deref() == Some(id) {
                    panic!("stub engine asked to panic on {}", id);
                }
                self.with_container(id, |c| {
                    Ok(ContainerInspectResponse {
                        id: Some(c.id.clone()),
                        name: c.name.as_ref().map(|n| format!("/{}", n)),
                        state: Some(ContainerState {
                            running: Some(c.running),
                            paused: Some(c.paused),
                            ..Default::default()
                        }),
                        ..Default::default()
                    })
                })
            })
            .await
    }

    async fn remove_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |_| Ok(()))?;
                let mut containers = self.containers.lock().expect("stub lock");
                containers.retain(|c| c.id != id && c.name.as_deref() != Some(id));
                Ok(())
            })
            .await
    }

    async fn start_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    if c.running {
                        return Err(EngineFailure::ContainerAlreadyRunning { id: id.to_string() });
                    }
                    c.running = true;
                    Ok(())
                })
            })
            .await
    }

    async fn stop_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    if !c.running {
                        return Err(EngineFailure::ContainerNotRunning { id: id.to_string() });
                    }
                    c.running = false;
                    Ok(())
                })
            })
            .await
    }

    async fn restart_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    c.running = true;
                    Ok(())
                })
            })
            .await
    }

    async fn kill_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    if !c.running {
                        return Err(EngineFailure::ContainerNotRunning { id: id.to_string() });
                    }
                    c.running = false;
                    Ok(())
                })
            })
            .await
    }

    async fn pause_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    if !c.running {
                        return Err(EngineFailure::Engine {
                            status: 409,
                            message: format!("Container {} is not running", id),
                        });
                    }
                    c.paused = true;
                    Ok(())
                })
            })
            .await
    }

    async fn unpause_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    c.paused = false;
                    Ok(())
                })
            })
            .await
    }

    async fn container_logs(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |_| Ok(LOG_BYTES.to_vec()))
            })
            .await
    }

    async fn export_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |_| Ok(EXPORT_BYTES.to_vec()))
            })
            .await
    }

    async fn top_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerTopResponse> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |_| Ok(ContainerTopResponse::default()))
            })
            .await
    }

    async fn wait_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerWaitResponse> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    c.running = false;
                    Ok(ContainerWaitResponse::default())
                })
            })
            .await
    }

    async fn rename_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
        new_name: &str,
    ) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |c| {
                    c.name = Some(new_name.to_string());
                    Ok(())
                })
            })
            .await
    }

    async fn update_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
        _request: &UpdateContainerRequest,
    ) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |_| Ok(()))
            })
            .await
    }

    async fn resize_container_tty(
        &self,
        scope: &DeadlineScope,
        id: &str,
        _size: ResizeTtyRequest,
    ) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                self.with_container(id, |_| Ok(()))
            })
            .await
    }

    async fn prune_containers(
        &self,
        scope: &DeadlineScope,
    ) -> EngineResult<ContainerPruneResponse> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                let mut containers = self.containers.lock().expect("stub lock");
                let deleted: Vec<String> = containers
                    .iter()
                    .filter(|c| !c.running)
                    .map(|c| c.id.clone())
                    .collect();
                containers.retain(|c| c.running);
                Ok(ContainerPruneResponse {
                    containers_deleted: Some(deleted),
                    space_reclaimed: Some(0),
                })
            })
            .await
    }

    async fn list_networks(&self, scope: &DeadlineScope) -> EngineResult<Vec<Network>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Ok(vec![Network {
                    name: Some("bridge".to_string()),
                    ..Default::default()
                }])
            })
            .await
    }

    async fn list_volumes(&self, scope: &DeadlineScope) -> EngineResult<VolumeListResponse> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Ok(VolumeListResponse::default())
            })
            .await
    }

    async fn list_images(&self, scope: &DeadlineScope) -> EngineResult<Vec<ImageSummary>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Ok(vec![ImageSummary {
                    id: "sha256:feed".to_string(),
                    ..Default::default()
                }])
            })
            .await
    }

    async fn search_images(
        &self,
        scope: &DeadlineScope,
        term: &str,
    ) -> EngineResult<Vec<ImageSearchResponseItem>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Ok(vec![ImageSearchResponseItem {
                    name: Some(term.to_string()),
                    ..Default::default()
                }])
            })
            .await
    }

    async fn inspect_image(&self, scope: &DeadlineScope, id: &str) -> EngineResult<ImageInspect> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Self::known_image(id)?;
                Ok(ImageInspect {
                    id: Some("sha256:feed".to_string()),
                    ..Default::default()
                })
            })
            .await
    }

    async fn image_history(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<Vec<HistoryResponseItem>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Self::known_image(id)?;
                Ok(vec![HistoryResponseItem::default()])
            })
            .await
    }

    async fn remove_image(
        &self,
        scope: &DeadlineScope,
        id: &str,
        _options: RemoveImageRequest,
    ) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Self::known_image(id)
            })
            .await
    }

    async fn tag_image(
        &self,
        scope: &DeadlineScope,
        id: &str,
        _request: &TagImageRequest,
    ) -> EngineResult<()> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Self::known_image(id)
            })
            .await
    }

    async fn export_image(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                Self::known_image(id)?;
                Ok(EXPORT_BYTES.to_vec())
            })
            .await
    }

    async fn export_images(&self, scope: &DeadlineScope, ids: &[String]) -> EngineResult<Vec<u8>> {
        self.record();
        scope
            .run(async {
                self.pause_for_delay().await;
                for id in ids {
                    Self::known_image(id)?;
                }
                Ok(EXPORT_BYTES.to_vec())
            })
            .await
    }
}

/// A response with its body fully read.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("body should be JSON")
    }

    pub fn error(&self) -> String {
        self.json()["error"]
            .as_str()
            .expect("envelope should carry an error")
            .to_string()
    }

    pub fn message(&self) -> String {
        self.json()["message"]
            .as_str()
            .expect("envelope should carry a message")
            .to_string()
    }
}

/// The router wired to a `StubEngine`, mounted at the root.
pub struct Harness {
    pub app: Router,
    pub engine: Arc<StubEngine>,
    pub deadlines: DeadlineManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_engine(StubEngine::new())
    }

    pub fn with_engine(engine: StubEngine) -> Self {
        Self::build(engine, DeadlinePolicy::default(), Classifier::default())
    }

    pub fn build(engine: StubEngine, policy: DeadlinePolicy, classifier: Classifier) -> Self {
        let engine = Arc::new(engine);
        let state = AppState::new(engine.clone(), policy, classifier);
        let deadlines = state.deadlines.clone();
        let gate = AuthGate::new(TOKEN_HEADER, Some(TOKEN)).expect("valid gate");
        Self {
            app: create_router(state, gate),
            engine,
            deadlines,
        }
    }

    /// Sends an authenticated request.
    pub async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> Reply {
        send_to(&self.app, method, uri, body, Some(TOKEN)).await
    }

    /// Sends a request carrying `token` (or no token header at all).
    pub async fn send_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
        token: Option<&str>,
    ) -> Reply {
        send_to(&self.app, method, uri, body, token).await
    }
}

/// Drives `app` with one request via `oneshot`.
pub async fn send_to(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
    token: Option<&str>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    Reply {
        status,
        headers,
        body,
    }
}
