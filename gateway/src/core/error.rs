//! # dockapi Error Types
//!
//! File: gateway/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the two error families used by the gateway:
//!
//! - `ApiError`: the per-request failure taxonomy. Every request that does not
//!   succeed ends in exactly one of these variants, and each variant owns one
//!   HTTP status code. Values are produced by the handlers (`BadRequest`,
//!   `Unimplemented`), the authentication gate (`Unauthorized`) and the error
//!   classifier (everything else).
//! - `GatewayError`: failures that can only happen while the process starts
//!   (configuration, engine connection). These are fatal.
//!
//! ## Architecture
//!
//! `Result<T>` aliases `anyhow::Result<T>` for startup code, so configuration
//! and connection failures can be enriched with `.context(..)` before `main`
//! reports them. Request handling never goes through `anyhow`; it returns
//! `ApiError` directly so the status code is always known.
//!
//! ## Examples
//!
//! ```rust
//! use dockapi::core::error::ApiError;
//! use axum::http::StatusCode;
//!
//! let err = ApiError::NotFound("No such container: web".to_string());
//! assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
//! assert_eq!(err.kind(), "not_found");
//! ```
//!
use axum::http::StatusCode;
use thiserror::Error;

/// Failure taxonomy for a single gateway request.
///
/// The `Display` text of a variant is what ends up in the `error` field of the
/// response envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed or undecodable input, rejected before any engine call.
    #[error("{0}")]
    BadRequest(String),

    /// The shared-secret header was missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// The engine reported that the addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The resource is already in the requested state, or the name is taken.
    #[error("{0}")]
    Conflict(String),

    /// Deliberately stubbed operation.
    #[error("Not implemented")]
    Unimplemented,

    /// Deadline expiry, only produced when distinct timeout reporting is enabled.
    #[error("{0}")]
    GatewayTimeout(String),

    /// Everything else, including transport failures.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            Self::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-friendly category name, used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unimplemented => "unimplemented",
            Self::GatewayTimeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

/// Errors raised while bringing the gateway up.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported engine endpoint '{0}'. Expected unix://, tcp:// or http://")]
    UnsupportedEndpoint(String),

    #[error("Docker API interaction failed: {source}")]
    DockerApi {
        #[from]
        source: bollard::errors::Error,
    },
}

/// Type alias for Result using anyhow::Error for startup code paths.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Unimplemented.status_code(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            ApiError::GatewayTimeout("late".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ApiError::Unimplemented.to_string(), "Not implemented");
        assert_eq!(ApiError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(
            ApiError::NotFound("No such container: abc".into()).to_string(),
            "No such container: abc"
        );

        let config_err = GatewayError::Config("Missing setting 'foo'".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing setting 'foo'"
        );
    }
}
