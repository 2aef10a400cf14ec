//! # dockapi Error Classifier
//!
//! File: gateway/src/api/classify.rs
//!
//! ## Overview
//!
//! Maps an `EngineFailure` plus the identifying parameters of the attempted
//! operation onto exactly one `ApiError`. The decision is made by rebuilding
//! the failure values the adapter would produce for *this* request's resource
//! id and comparing rendered text:
//!
//! 1. Render the "no such <kind>: <id>" template for the request id. Equal →
//!    `NotFound` (404).
//! 2. For verbs with a known state conflict (start, stop, kill, create),
//!    render the matching "already running" / "not running" / "already exists"
//!    template. Equal → `Conflict` (409).
//! 3. A deadline expiry becomes `GatewayTimeout` (504) when distinct timeout
//!    reporting is enabled.
//! 4. Everything else, transport failures included → `Internal` (500).
//!
//! Because the comparison uses the request's own id, a "no such container"
//! failure that names a *different* resource is not reported as 404.
//!
//! Malformed bodies (400) and authentication (401) never reach this module;
//! they are rejected earlier by the handlers and the middleware.
//!
use crate::common::engine::{EngineFailure, ResourceKind};
use crate::core::error::ApiError;

/// The verb of an attempted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Inspect,
    Create,
    Remove,
    Start,
    Stop,
    Restart,
    Kill,
    Pause,
    Unpause,
    Logs,
    Export,
    Top,
    Wait,
    Rename,
    Update,
    Resize,
    Prune,
    Search,
    History,
    Tag,
    Info,
}

/// Identifying parameters of one attempted engine operation.
///
/// `id` is the resource identifier exactly as the caller supplied it (for
/// `Create`, the requested container name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: ResourceKind,
    pub verb: Verb,
    pub id: Option<String>,
}

impl Operation {
    /// An operation addressed to a single resource.
    pub fn on(kind: ResourceKind, verb: Verb, id: &str) -> Self {
        Self {
            kind,
            verb,
            id: Some(id.to_string()),
        }
    }

    /// An operation over the whole collection (list, prune, search, ...).
    pub fn collection(kind: ResourceKind, verb: Verb) -> Self {
        Self {
            kind,
            verb,
            id: None,
        }
    }
}

/// Pure mapping from engine failures to the response taxonomy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    distinct_timeouts: bool,
}

impl Classifier {
    pub fn new(distinct_timeouts: bool) -> Self {
        Self { distinct_timeouts }
    }

    /// Classifies `failure` for `operation`. Never retries, never escalates.
    pub fn classify(&self, operation: &Operation, failure: &EngineFailure) -> ApiError {
        let rendered = failure.to_string();

        if let Some(id) = operation.id.as_deref() {
            if rendered == EngineFailure::not_found(operation.kind, id).to_string() {
                return ApiError::NotFound(rendered);
            }
            if let Some(template) = conflict_template(operation, id) {
                if rendered == template.to_string() {
                    return ApiError::Conflict(rendered);
                }
            }
        }

        match failure {
            EngineFailure::Timeout(_) if self.distinct_timeouts => ApiError::GatewayTimeout(rendered),
            _ => ApiError::Internal(rendered),
        }
    }
}

/// The "already in that state" failure a verb can run into, if any.
fn conflict_template(operation: &Operation, id: &str) -> Option<EngineFailure> {
    if operation.kind != ResourceKind::Container {
        return None;
    }
    let id = id.to_string();
    match operation.verb {
        Verb::Start => Some(EngineFailure::ContainerAlreadyRunning { id }),
        Verb::Stop | Verb::Kill => Some(EngineFailure::ContainerNotRunning { id }),
        Verb::Create => Some(EngineFailure::ContainerAlreadyExists { name: id }),
        _ => None,
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::time::Duration;

    fn container(verb: Verb, id: &str) -> Operation {
        Operation::on(ResourceKind::Container, verb, id)
    }

    #[test]
    fn test_not_found_for_every_kind() {
        let classifier = Classifier::default();
        for kind in [
            ResourceKind::Container,
            ResourceKind::Image,
            ResourceKind::Network,
            ResourceKind::Volume,
        ] {
            let op = Operation::on(kind, Verb::Inspect, "ghost");
            let err = classifier.classify(&op, &EngineFailure::not_found(kind, "ghost"));
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
            assert!(err.to_string().contains("ghost"));
        }
    }

    #[test]
    fn test_not_found_requires_matching_id() {
        let classifier = Classifier::default();
        let err = classifier.classify(
            &container(Verb::Inspect, "web"),
            &EngineFailure::NoSuchContainer { id: "db".into() },
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_state_conflicts() {
        let classifier = Classifier::default();
        let cases = [
            (Verb::Start, EngineFailure::ContainerAlreadyRunning { id: "web".into() }),
            (Verb::Stop, EngineFailure::ContainerNotRunning { id: "web".into() }),
            (Verb::Kill, EngineFailure::ContainerNotRunning { id: "web".into() }),
            (Verb::Create, EngineFailure::ContainerAlreadyExists { name: "web".into() }),
        ];
        for (verb, failure) in cases {
            let err = classifier.classify(&container(verb, "web"), &failure);
            assert_eq!(err.status_code(), StatusCode::CONFLICT, "verb {:?}", verb);
        }
    }

    #[test]
    fn test_conflict_only_for_conflict_verbs() {
        // "not running" on pause is an engine fault, not a known idempotency conflict.
        let err = Classifier::default().classify(
            &container(Verb::Pause, "web"),
            &EngineFailure::ContainerNotRunning { id: "web".into() },
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_collection_operations_are_internal() {
        let err = Classifier::default().classify(
            &Operation::collection(ResourceKind::Network, Verb::List),
            &EngineFailure::Engine {
                status: 500,
                message: "boom".into(),
            },
        );
        assert_eq!(err, ApiError::Internal("boom".into()));
    }

    #[test]
    fn test_transport_is_internal() {
        let err = Classifier::default().classify(
            &container(Verb::Inspect, "web"),
            &EngineFailure::Transport("connection refused".into()),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_timeout_policy() {
        let failure = EngineFailure::Timeout(Duration::from_secs(5));
        let op = container(Verb::Logs, "web");

        let folded = Classifier::new(false).classify(&op, &failure);
        assert_eq!(folded.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let distinct = Classifier::new(true).classify(&op, &failure);
        assert_eq!(distinct.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
