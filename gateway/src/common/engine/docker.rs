//! # dockapi Docker Engine Adapter
//!
//! File: gateway/src/common/engine/docker.rs
//!
//! ## Overview
//!
//! `DockerEngine` implements the `Engine` trait on top of `bollard`. Each method
//! issues exactly one bollard request inside the caller's `DeadlineScope` and
//! translates the bollard error into an `EngineFailure`:
//!
//! - `DockerResponseServerError { status_code: 404 }` → `NoSuch<Kind> { id }`
//! - `304` on start → `ContainerAlreadyRunning`, `304` on stop and `409` on kill
//!   → `ContainerNotRunning`, `409` on create → `ContainerAlreadyExists`
//! - any other engine response → `Engine { status, message }` (forwarded)
//! - everything that is not an engine response (socket, hyper, JSON) →
//!   `Transport`
//!
//! Streaming endpoints (logs, export) are drained fully into memory before
//! the call returns, so the whole transfer counts against the scope.
//!
use super::{
    CreateContainerRequest, Engine, EngineFailure, EngineResult, RemoveImageRequest,
    ResizeTtyRequest, ResourceKind, TagImageRequest, UpdateContainerRequest,
};
use crate::common::deadline::DeadlineScope;
use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, InspectContainerOptions, KillContainerOptions,
        ListContainersOptions, LogsOptions, PruneContainersOptions, RemoveContainerOptions,
        RenameContainerOptions, ResizeContainerTtyOptions, RestartContainerOptions,
        StartContainerOptions, StopContainerOptions, TopOptions, UpdateContainerOptions,
        WaitContainerOptions,
    },
    errors::Error as BollardError,
    image::{ListImagesOptions, RemoveImageOptions, SearchImagesOptions, TagImageOptions},
    models::{
        ContainerCreateResponse, ContainerInspectResponse, ContainerPruneResponse,
        ContainerSummary, ContainerTopResponse, ContainerWaitExitError, ContainerWaitResponse,
        HistoryResponseItem, ImageInspect, ImageSearchResponseItem, ImageSummary, Network,
        SystemInfo, VolumeListResponse,
    },
    network::ListNetworksOptions,
    volume::ListVolumesOptions,
    Docker,
};
use futures_util::{StreamExt, TryStreamExt};
use tracing::{debug, instrument};

/// `Engine` implementation backed by a shared `bollard::Docker` handle.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

/// # Map Addressed Error (`map_error`)
///
/// Maps a bollard error for a request addressed to one resource.
///
/// ## Arguments
///
/// * `e` - The error bollard returned.
/// * `kind` - The resource kind the request targeted.
/// * `id` - The id or name exactly as the caller supplied it.
///
/// ## Returns
///
/// `NoSuch<Kind>` carrying `id` for an engine 404; otherwise the same mapping
/// as `map_unaddressed_error`.
fn map_error(e: BollardError, kind: ResourceKind, id: &str) -> EngineFailure {
    match e {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => EngineFailure::not_found(kind, id),
        other => map_unaddressed_error(other),
    }
}

/// Maps a bollard error for a request without a resource id.
fn map_unaddressed_error(e: BollardError) -> EngineFailure {
    // Engine responses keep their status and text; anything else never reached the engine.
    match e {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => EngineFailure::Engine {
            status: status_code,
            message,
        },
        other => EngineFailure::Transport(other.to_string()),
    }
}

/// Maps a multi-image export failure. A single reference is addressed, so a
/// 404 names it; with several the engine does not say which one is missing.
fn map_bulk_export_error(e: BollardError, ids: &[String]) -> EngineFailure {
    match ids {
        [single] => map_error(e, ResourceKind::Image, single),
        _ => map_unaddressed_error(e),
    }
}

fn map_start_error(e: BollardError, id: &str) -> EngineFailure {
    match e {
        BollardError::DockerResponseServerError {
            status_code: 304, ..
        } => EngineFailure::ContainerAlreadyRunning { id: id.to_string() },
        other => map_error(other, ResourceKind::Container, id),
    }
}

fn map_stop_error(e: BollardError, id: &str) -> EngineFailure {
    match e {
        BollardError::DockerResponseServerError {
            status_code: 304, ..
        } => EngineFailure::ContainerNotRunning { id: id.to_string() },
        other => map_error(other, ResourceKind::Container, id),
    }
}

fn map_kill_error(e: BollardError, id: &str) -> EngineFailure {
    match e {
        BollardError::DockerResponseServerError {
            status_code: 409, ..
        } => EngineFailure::ContainerNotRunning { id: id.to_string() },
        other => map_error(other, ResourceKind::Container, id),
    }
}

fn map_create_error(e: BollardError, name: &str, image: &str) -> EngineFailure {
    match e {
        BollardError::DockerResponseServerError {
            status_code: 409, ..
        } => EngineFailure::ContainerAlreadyExists {
            name: name.to_string(),
        },
        // On create the only addressable resource that can be missing is the image.
        other => map_error(other, ResourceKind::Image, image),
    }
}

fn container_config(request: &CreateContainerRequest) -> Config<String> {
    let spec = &request.config;
    Config {
        image: Some(spec.image.clone()),
        cmd: spec.cmd.clone(),
        entrypoint: spec.entrypoint.clone(),
        env: spec.env.clone(),
        labels: spec.labels.clone(),
        working_dir: spec.working_dir.clone(),
        user: spec.user.clone(),
        tty: spec.tty,
        open_stdin: spec.open_stdin,
        host_config: request.host_config.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl Engine for DockerEngine {
    #[instrument(skip(self, scope))]
    async fn info(&self, scope: &DeadlineScope) -> EngineResult<SystemInfo> {
        scope
            .run(async { self.docker.info().await.map_err(map_unaddressed_error) })
            .await
    }

    #[instrument(skip(self, scope))]
    async fn list_containers(&self, scope: &DeadlineScope) -> EngineResult<Vec<ContainerSummary>> {
        let options = Some(ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        });
        scope
            .run(async {
                self.docker
                    .list_containers(options)
                    .await
                    .map_err(map_unaddressed_error)
            })
            .await
    }

    #[instrument(skip(self, scope, request), fields(image = %request.config.image, name = ?request.name))]
    async fn create_container(
        &self,
        scope: &DeadlineScope,
        request: &CreateContainerRequest,
    ) -> EngineResult<ContainerCreateResponse> {
        let options = request.name.clone().map(|name| CreateContainerOptions {
            name,
            platform: None,
        });
        let config = container_config(request);
        let name = request.name.as_deref().unwrap_or_default();
        scope
            .run(async {
                self.docker
                    .create_container(options, config)
                    .await
                    .map_err(|e| map_create_error(e, name, &request.config.image))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn inspect_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerInspectResponse> {
        scope
            .run(async {
                self.docker
                    .inspect_container(id, None::<InspectContainerOptions>)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn remove_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        let options = Some(RemoveContainerOptions {
            v: false,
            force: false,
            ..Default::default()
        });
        scope
            .run(async {
                self.docker
                    .remove_container(id, options)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn start_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        scope
            .run(async {
                self.docker
                    .start_container(id, None::<StartContainerOptions<String>>)
                    .await
                    .map_err(|e| map_start_error(e, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn stop_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        // Zero grace period: the engine kills the process right after SIGTERM.
        let options = Some(StopContainerOptions { t: 0 });
        scope
            .run(async {
                self.docker
                    .stop_container(id, options)
                    .await
                    .map_err(|e| map_stop_error(e, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn restart_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        let options = Some(RestartContainerOptions { t: 0 });
        scope
            .run(async {
                self.docker
                    .restart_container(id, options)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn kill_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        scope
            .run(async {
                self.docker
                    .kill_container(id, None::<KillContainerOptions<String>>)
                    .await
                    .map_err(|e| map_kill_error(e, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn pause_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        scope
            .run(async {
                self.docker
                    .pause_container(id)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn unpause_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<()> {
        scope
            .run(async {
                self.docker
                    .unpause_container(id)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn container_logs(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>> {
        let options = Some(LogsOptions::<String> {
            stdout: true,
            stderr: true,
            timestamps: true,
            tail: "all".to_string(),
            ..Default::default()
        });
        scope
            .run(async {
                let buffer = self
                    .docker
                    .logs(id, options)
                    .try_fold(Vec::new(), |mut buffer, chunk| async move {
                        buffer.extend_from_slice(&chunk.into_bytes());
                        Ok(buffer)
                    })
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))?;
                debug!("Buffered {} bytes of logs for '{}'", buffer.len(), id);
                Ok(buffer)
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn export_container(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>> {
        scope
            .run(async {
                self.docker
                    .export_container(id)
                    .try_fold(Vec::new(), |mut archive, chunk| async move {
                        archive.extend_from_slice(&chunk);
                        Ok(archive)
                    })
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn top_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerTopResponse> {
        scope
            .run(async {
                self.docker
                    .top_processes(id, None::<TopOptions<String>>)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn wait_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<ContainerWaitResponse> {
        scope
            .run(async {
                let mut stream = self
                    .docker
                    .wait_container(id, None::<WaitContainerOptions<String>>)
                    .boxed();
                match stream.next().await {
                    Some(Ok(status)) => Ok(status),
                    // bollard surfaces a non-zero exit as an error; it is still an exit record.
                    Some(Err(BollardError::DockerContainerWaitError { error, code })) => {
                        Ok(ContainerWaitResponse {
                            status_code: code,
                            error: Some(ContainerWaitExitError {
                                message: Some(error),
                            }),
                        })
                    }
                    Some(Err(e)) => Err(map_error(e, ResourceKind::Container, id)),
                    None => Err(EngineFailure::Transport(
                        "wait stream ended without an exit status".to_string(),
                    )),
                }
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn rename_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
        new_name: &str,
    ) -> EngineResult<()> {
        let options = RenameContainerOptions {
            name: new_name.to_string(),
        };
        scope
            .run(async {
                self.docker
                    .rename_container(id, options)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope, request), fields(container = %id))]
    async fn update_container(
        &self,
        scope: &DeadlineScope,
        id: &str,
        request: &UpdateContainerRequest,
    ) -> EngineResult<()> {
        let options = UpdateContainerOptions::<String> {
            memory: request.memory,
            memory_swap: request.memory_swap,
            cpu_shares: request.cpu_shares.map(|shares| shares as isize),
            cpu_period: request.cpu_period,
            cpu_quota: request.cpu_quota,
            pids_limit: request.pids_limit,
            restart_policy: request.restart_policy.clone(),
            ..Default::default()
        };
        scope
            .run(async {
                self.docker
                    .update_container(id, options)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(container = %id))]
    async fn resize_container_tty(
        &self,
        scope: &DeadlineScope,
        id: &str,
        size: ResizeTtyRequest,
    ) -> EngineResult<()> {
        let options = ResizeContainerTtyOptions {
            width: size.width,
            height: size.height,
        };
        scope
            .run(async {
                self.docker
                    .resize_container_tty(id, options)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Container, id))
            })
            .await
    }

    #[instrument(skip(self, scope))]
    async fn prune_containers(
        &self,
        scope: &DeadlineScope,
    ) -> EngineResult<ContainerPruneResponse> {
        scope
            .run(async {
                self.docker
                    .prune_containers(None::<PruneContainersOptions<String>>)
                    .await
                    .map_err(map_unaddressed_error)
            })
            .await
    }

    #[instrument(skip(self, scope))]
    async fn list_networks(&self, scope: &DeadlineScope) -> EngineResult<Vec<Network>> {
        scope
            .run(async {
                self.docker
                    .list_networks(None::<ListNetworksOptions<String>>)
                    .await
                    .map_err(map_unaddressed_error)
            })
            .await
    }

    #[instrument(skip(self, scope))]
    async fn list_volumes(&self, scope: &DeadlineScope) -> EngineResult<VolumeListResponse> {
        scope
            .run(async {
                self.docker
                    .list_volumes(None::<ListVolumesOptions<String>>)
                    .await
                    .map_err(map_unaddressed_error)
            })
            .await
    }

    #[instrument(skip(self, scope))]
    async fn list_images(&self, scope: &DeadlineScope) -> EngineResult<Vec<ImageSummary>> {
        scope
            .run(async {
                self.docker
                    .list_images(None::<ListImagesOptions<String>>)
                    .await
                    .map_err(map_unaddressed_error)
            })
            .await
    }

    #[instrument(skip(self, scope))]
    async fn search_images(
        &self,
        scope: &DeadlineScope,
        term: &str,
    ) -> EngineResult<Vec<ImageSearchResponseItem>> {
        let options = SearchImagesOptions {
            term: term.to_string(),
            ..Default::default()
        };
        scope
            .run(async {
                self.docker
                    .search_images(options)
                    .await
                    .map_err(map_unaddressed_error)
            })
            .await
    }

    #[instrument(skip(self, scope), fields(image = %id))]
    async fn inspect_image(&self, scope: &DeadlineScope, id: &str) -> EngineResult<ImageInspect> {
        scope
            .run(async {
                self.docker
                    .inspect_image(id)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Image, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(image = %id))]
    async fn image_history(
        &self,
        scope: &DeadlineScope,
        id: &str,
    ) -> EngineResult<Vec<HistoryResponseItem>> {
        scope
            .run(async {
                self.docker
                    .image_history(id)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Image, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(image = %id))]
    async fn remove_image(
        &self,
        scope: &DeadlineScope,
        id: &str,
        options: RemoveImageRequest,
    ) -> EngineResult<()> {
        let options = Some(RemoveImageOptions {
            force: options.force,
            noprune: options.noprune,
        });
        scope
            .run(async {
                let deleted = self
                    .docker
                    .remove_image(id, options, None)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Image, id))?;
                debug!("Engine removed {} image entries for '{}'", deleted.len(), id);
                Ok(())
            })
            .await
    }

    #[instrument(skip(self, scope, request), fields(image = %id, repo = %request.repo, tag = %request.tag))]
    async fn tag_image(
        &self,
        scope: &DeadlineScope,
        id: &str,
        request: &TagImageRequest,
    ) -> EngineResult<()> {
        let options = Some(TagImageOptions {
            repo: request.repo.clone(),
            tag: request.tag.clone(),
        });
        scope
            .run(async {
                self.docker
                    .tag_image(id, options)
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Image, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(image = %id))]
    async fn export_image(&self, scope: &DeadlineScope, id: &str) -> EngineResult<Vec<u8>> {
        scope
            .run(async {
                self.docker
                    .export_image(id)
                    .try_fold(Vec::new(), |mut archive, chunk| async move {
                        archive.extend_from_slice(&chunk);
                        Ok(archive)
                    })
                    .await
                    .map_err(|e| map_error(e, ResourceKind::Image, id))
            })
            .await
    }

    #[instrument(skip(self, scope), fields(images = ?ids))]
    async fn export_images(&self, scope: &DeadlineScope, ids: &[String]) -> EngineResult<Vec<u8>> {
        let names: Vec<&str> = ids.iter().map(String::as_str).collect();
        scope
            .run(async {
                self.docker
                    .export_images(&names)
                    .try_fold(Vec::new(), |mut archive, chunk| async move {
                        archive.extend_from_slice(&chunk);
                        Ok(archive)
                    })
                    .await
                    .map_err(|e| map_bulk_export_error(e, ids))
            })
            .await
    }
}
