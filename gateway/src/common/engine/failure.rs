//! # dockapi Engine Failures
//!
//! File: gateway/src/common/engine/failure.rs
//!
//! ## Overview
//!
//! `EngineFailure` is the failure half of an engine outcome. Its variants are
//! renderable values: the `Display` text of the resource-specific variants is
//! the exact template the error classifier rebuilds from the request's own
//! resource id and compares against (`No such container: <id>`,
//! `Container already running: <id>`, ...).
//!
//! Adapters construct these values from whatever their engine client reports.
//! The bollard adapter derives them from the engine's HTTP status codes, so the
//! rendered text only depends on this module and never on engine wording.
//!
use super::ResourceKind;
use std::time::Duration;
use thiserror::Error;

/// Result of a single engine call.
pub type EngineResult<T> = std::result::Result<T, EngineFailure>;

/// A classified failure reported by an `Engine` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineFailure {
    #[error("No such container: {id}")]
    NoSuchContainer { id: String },

    #[error("No such image: {id}")]
    NoSuchImage { id: String },

    #[error("No such network: {id}")]
    NoSuchNetwork { id: String },

    #[error("No such volume: {id}")]
    NoSuchVolume { id: String },

    #[error("Container already running: {id}")]
    ContainerAlreadyRunning { id: String },

    #[error("Container not running: {id}")]
    ContainerNotRunning { id: String },

    #[error("Container already exists: {name}")]
    ContainerAlreadyExists { name: String },

    /// The control socket could not be reached or the exchange could not be decoded.
    #[error("Engine transport failure: {0}")]
    Transport(String),

    /// The deadline scope expired while the call was outstanding.
    #[error("Engine call exceeded its deadline of {0:?}")]
    Timeout(Duration),

    /// Any other engine response, forwarded unmodified.
    #[error("{message}")]
    Engine { status: u16, message: String },
}

impl EngineFailure {
    /// Builds the "no such resource" value for `kind` and `id`.
    #[must_use]
    pub fn not_found(kind: ResourceKind, id: &str) -> Self {
        let id = id.to_string();
        match kind {
            ResourceKind::Container => Self::NoSuchContainer { id },
            ResourceKind::Image => Self::NoSuchImage { id },
            ResourceKind::Network => Self::NoSuchNetwork { id },
            ResourceKind::Volume => Self::NoSuchVolume { id },
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
