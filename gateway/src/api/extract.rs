//! # dockapi Request Extractors
//!
//! File: gateway/src/api/extract.rs
//!
//! ## Overview
//!
//! Thin wrappers around axum's `Path`, `Query` and `Bytes` extractors. axum
//! answers a failed extraction with its own plain-text body; these wrappers
//! turn every rejection into `ApiError::BadRequest` so the caller always gets
//! the JSON envelope:
//!
//! - **`ResourceId`**: the `{id}` path segment (rejects invalid UTF-8).
//! - **`QueryArgs<T>`**: the query string decoded into `T`.
//! - **`JsonBody<T>`**: the request body buffered and decoded as JSON. An
//!   oversized body (axum's default body limit) is a bad request too.
//!
//! All three run before the handler, so a rejection never opens a deadline
//! scope and never reaches the engine.
//!
use crate::api::handlers::decode_body;
use crate::core::error::ApiError;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Logs a rejected input once and encodes it as a 400 envelope.
fn rejected(err: ApiError) -> Response {
    warn!(kind = err.kind(), "{}", err);
    err.into_response()
}

/// The `{id}` segment of a resource route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId(pub String);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => Err(rejected(ApiError::BadRequest(format!(
                "Invalid resource id: {}",
                rejection.body_text()
            )))),
        }
    }
}

/// Query parameters decoded into `T`.
#[derive(Debug, Clone)]
pub struct QueryArgs<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryArgs<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(args)) => Ok(Self(args)),
            Err(rejection) => Err(rejected(ApiError::BadRequest(format!(
                "Invalid query string: {}",
                rejection.body_text()
            )))),
        }
    }
}

/// A JSON request body decoded into `T`.
///
/// The content type is not checked; engine clients commonly omit it.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Buffering enforces the body limit; its rejection carries a 413 we fold into 400.
        let bytes = Bytes::from_request(request, state).await.map_err(|rejection| {
            rejected(ApiError::BadRequest(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        })?;
        decode_body(&bytes).map(Self).map_err(rejected)
    }
}
