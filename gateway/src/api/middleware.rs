//! # dockapi Middleware Chain
//!
//! File: gateway/src/api/middleware.rs
//!
//! ## Overview
//!
//! Two ordered stages wrap every route:
//!
//! 1. **Content negotiation** (`json_content_type`): responses carry
//!    `Content-Type: application/json` unless the handler chose another type
//!    (binary exports do).
//! 2. **Authentication gate** (`require_token`): compares one request header
//!    against a static shared secret. A mismatch stops the chain with a 401
//!    envelope; no handler runs, no deadline scope is opened, the engine is
//!    never called.
//!
//! The configured auth header is also marked sensitive before request tracing
//! sees it (`redact_auth_header`), so span fields print `Sensitive` in place
//! of the secret.
//!
//! ```text
//! Received ─► [auth] ─fail─► Rejected(401)
//!                └─pass─► Routed ─► Dispatched ─► Succeeded | Classified
//! ```
//!
use crate::core::config::AuthConfig;
use crate::core::error::{ApiError, GatewayError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::iter;
use std::sync::Arc;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

/// Layer setting the JSON content type on responses that do not carry one.
pub fn json_content_type() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    )
}

/// # Redact Auth Header (`redact_auth_header`)
///
/// Marks the gate's header as sensitive on every request.
///
/// ## Arguments
///
/// * `gate` - The configured gate; only its header name is used.
///
/// ## Returns
///
/// A layer that must sit outside `TraceLayer` so the span made with
/// `include_headers(true)` records the value as `Sensitive`.
pub fn redact_auth_header(gate: &AuthGate) -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(iter::once(gate.header().clone()))
}

/// Shared-secret authentication settings, cloned into the middleware.
#[derive(Debug, Clone)]
pub struct AuthGate {
    header: HeaderName,
    token: Option<Arc<str>>,
}

impl AuthGate {
    /// A gate that requires `header: token` on every request.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if `header` is not a valid header name.
    pub fn new(header: &str, token: Option<&str>) -> Result<Self, GatewayError> {
        let header = HeaderName::from_bytes(header.trim().as_bytes()).map_err(|e| {
            GatewayError::Config(format!("Invalid auth header name '{}': {}", header, e))
        })?;
        Ok(Self {
            header,
            token: token.map(Arc::from),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, GatewayError> {
        Self::new(&config.header, config.token.as_deref())
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Whether `headers` satisfy the gate.
    pub fn admits(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.token.as_deref() else {
            return true;
        };
        headers
            .get(&self.header)
            .is_some_and(|value| value.as_bytes() == expected.as_bytes())
    }
}

/// `axum::middleware::from_fn_with_state` entry point for the gate.
pub async fn require_token(State(gate): State<AuthGate>, request: Request, next: Next) -> Response {
    if gate.admits(request.headers()) {
        return next.run(request).await;
    }

    warn!(
        method = %request.method(),
        path = %request.uri().path(),
        "Rejected request with missing or invalid '{}' header",
        gate.header
    );
    ApiError::Unauthorized.into_response()
}
