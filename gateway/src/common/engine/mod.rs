//! # dockapi Engine Client Adapter
//!
//! File: gateway/src/common/engine/mod.rs
//!
//! ## Overview
//!
//! This module is the narrow seam between the HTTP layer and the container
//! engine. Handlers only ever talk to the `Engine` trait; the production
//! implementation (`docker::DockerEngine`) wraps a `bollard::Docker` handle,
//! and tests substitute an in-memory stub.
//!
//! ## Architecture
//!
//! - **`failure`**: `EngineFailure` and the `EngineResult` alias.
//! - **`connect`**: Builds the process-wide `bollard::Docker` handle from the
//!   configured endpoint and probes it once at startup.
//! - **`docker`**: The bollard-backed `Engine` implementation.
//!
//! Contract shared by every trait method:
//!
//! - The first argument is the live `DeadlineScope` of the call. An
//!   implementation runs its engine request through `DeadlineScope::run`, so an
//!   expired scope yields `EngineFailure::Timeout` without reaching the engine.
//! - Exactly one engine request per method; no retries.
//! - Transport problems become `EngineFailure::Transport`; everything else the
//!   engine says is either mapped to a resource-specific variant or forwarded
//!   as `EngineFailure::Engine`.
//!
//! The handle is created once at startup and shared behind an `Arc`; it must be
//! safe for concurrent use without external locking.
//!
use crate::common::deadline::DeadlineScope;
use async_trait::async_trait;
use bollard::models::{
    ContainerCreateResponse, ContainerInspectResponse, ContainerPruneResponse,
    ContainerSummary, ContainerTopResponse, ContainerWaitResponse, HistoryResponseItem,
    HostConfig, ImageInspect, ImageSearchResponseItem, ImageSummary, Network, RestartPolicy,
    SystemInfo, VolumeListResponse,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

pub mod connect;
pub mod docker;
pub mod failure;

pub use failure::{EngineFailure, EngineResult};

/// The four kinds of engine-owned resources the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Container,
    Image,
    Network,
    Volume,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Container => "container",
            Self::Image => "image",
            Self::Network => "network",
            Self::Volume => "volume",
        };
        f.write_str(name)
    }
}

/// Body of `POST /containers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateContainerRequest {
    /// Optional container name; the engine generates one when absent.
    #[serde(default)]
    pub name: Option<String>,
    pub config: ContainerSpec,
    #[serde(default)]
    pub host_config: Option<HostConfig>,
}

/// Container configuration portion of a create request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSpec {
    pub image: String,
    #[serde(default)]
    pub cmd: Option<Vec<String>>,
    #[serde(default)]
    pub entrypoint: Option<Vec<String>>,
    #[serde(default)]
    pub env: Option<Vec<String>>,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub tty: Option<bool>,
    #[serde(default)]
    pub open_stdin: Option<bool>,
}

/// Body of `POST /containers/{id}/update`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateContainerRequest {
    #[serde(default)]
    pub memory: Option<i64>,
    #[serde(default)]
    pub memory_swap: Option<i64>,
    #[serde(default)]
    pub cpu_shares: Option<i64>,
    #[serde(default)]
    pub cpu_period: Option<i64>,
    #[serde(default)]
    pub cpu_quota: Option<i64>,
    #[serde(default)]
    pub pids_limit: Option<i64>,
    #[serde(default)]
    pub restart_policy: Option<RestartPolicy>,
}

/// Body of `POST /containers/{id}/rename`.
#[derive(Debug, Clone, Deserialize)]
pub struct RenameContainerRequest {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
}

/// Body of `POST /containers/{id}/resize`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResizeTtyRequest {
    #[serde(rename = "Height", alias = "height")]
    pub height: u16,
    #[serde(rename = "Width", alias = "width")]
    pub width: u16,
}

/// Options for `DELETE /images/{id}/extended`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveImageRequest {
    pub force: bool,
    pub noprune: bool,
}

/// Options for `POST /images/{id}/tag`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagImageRequest {
    pub repo: String,
    pub tag: String,
}

/// The Engine Client Adapter.
///
/// Every method performs exactly one engine request inside the given scope.
#[async_trait]
pub trait Engine: Send + Sync {
    // --- System ---
    async fn info(&self, scope: &DeadlineScope) -> EngineResult<SystemInfo>;

    // --- Containers ---
    async fn list_containers(&self, scope: &DeadlineScope) -> EngineResult<Vec<ContainerSummary>>;
    async fn create_container(
        &self,
        scope: &DeadlineScope,
        request: &CreateContainerRequest,
    ) -> EngineResult<ContainerCreateResponse>;
    async fn inspect_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerInspectResponse>;
    async fn remove_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()>;
    async fn start_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()>;
    async fn stop_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()>;
    async fn restart_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()>;
    async fn kill_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()>;
    async fn pause_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()>;
    async fn unpause_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()>;
    /// Returns the complete stdout+stderr log buffer, timestamps included.
    async fn container_logs(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>>;
    /// Returns the container filesystem as a tar stream.
    async fn export_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>>;
    async fn top_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerTopResponse>;
    async fn wait_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerWaitResponse>;
    async fn rename_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
        new_name: &str,
    ) -> EngineResult<()>;
    async fn update_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
        request: &UpdateContainerRequest,
    ) -> EngineResult<()>;
    async fn resize_container_tty(
        &self,
        scope: &DeadlineScope,
        id: &str,
        size: ResizeTtyRequest,
    ) -> EngineResult<()>;
    async fn prune_containers(&self, scope: &DeadlineScope)
        -> EngineResult<ContainerPruneResponse>;

    // --- Networks & Volumes ---
    async fn list_networks(&self, scope: &DeadlineScope) -> EngineResult<Vec<Network>>;
    async fn list_volumes(&self, scope: &DeadlineScope) -> EngineResult<VolumeListResponse>;

    // --- Images ---
    async fn list_images(&self, scope: &DeadlineScope) -> EngineResult<Vec<ImageSummary>>;
    async fn search_images(
        &self,
        scope: &DeadlineScope,
        term: &str,
    ) -> EngineResult<Vec<ImageSearchResponseItem>>;
    async fn inspect_image(&self, scope: &DeadlineScope, id: &str) -> EngineResult<ImageInspect>;
    async fn image_history(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<Vec<HistoryResponseItem>>;
    async fn remove_image(
        &self,
        scope: &DeadlineScope,
        id: &str,
        options: RemoveImageRequest,
    ) -> EngineResult<()>;
    async fn tag_image(
        &self,
        scope: &DeadlineScope,
        id: &str,
        request: &TagImageRequest,
    ) -> EngineResult<()>;
    async fn export_image(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>>;
    async fn export_images(&self, scope: &DeadlineScope, ids: &[String]) -> EngineResult<Vec<u8>>;
}
