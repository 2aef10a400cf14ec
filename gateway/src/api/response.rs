//! # dockapi Response Encoder
//!
//! File: gateway/src/api/response.rs
//!
//! ## Overview
//!
//! Every response the gateway writes goes through this module:
//!
//! - `payload`: a success value serialized verbatim as the JSON body.
//! - `message` / `status_only`: the `{message|error}` envelope for responses
//!   without a payload.
//! - `attachment`: raw bytes with a binary content type and an attachment
//!   disposition, bypassing the envelope entirely (exports).
//! - `impl IntoResponse for ApiError`: the failure envelope.
//!
//! If the JSON encoder itself fails, a literal fallback envelope is written
//! with status 500 instead. Encoding never panics.
//!
use crate::core::error::ApiError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Written verbatim when serializing a response body fails.
pub const FALLBACK_BODY: &str = r#"{"error":"Internal Server Error"}"#;

fn json() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

/// The uniform body of non-payload responses. Exactly one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            message: None,
            error: Some(text.into()),
        }
    }
}

/// Serializes `body` as JSON under `status`, degrading to `FALLBACK_BODY`.
pub fn encode<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, json())], bytes).into_response(),
        Err(e) => {
            error!("Failed to encode response body: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, json())],
                FALLBACK_BODY,
            )
                .into_response()
        }
    }
}

/// 200 with the success value as the body.
pub fn payload<T: Serialize + ?Sized>(value: &T) -> Response {
    encode(StatusCode::OK, value)
}

/// 200 with a `{"message": ...}` envelope.
pub fn message(text: &str) -> Response {
    encode(StatusCode::OK, &Envelope::message(text))
}

/// Envelope carrying the canonical reason phrase of `status`.
pub fn status_only(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    let envelope = if status.is_success() {
        Envelope::message(reason)
    } else {
        Envelope::error(reason)
    };
    encode(status, &envelope)
}

/// # Tarball Filename (`tar_filename`)
///
/// Derives the download name for an exported container or image.
///
/// ## Arguments
///
/// * `reference` - The id, name or image reference taken from the route.
///
/// ## Returns
///
/// `{reference}.tar` with every character that could end or split the
/// `Content-Disposition` parameter (`/ : " \ ;` and control characters)
/// replaced by `_`.
pub fn tar_filename(reference: &str) -> String {
    let mut name: String = reference
        .chars()
        .map(|c| match c {
            '/' | ':' | '"' | '\\' | ';' => '_',
            c if c.is_control() => '_',
            other => other,
        })
        .collect();
    name.push_str(".tar");
    name
}

/// 200 with raw bytes offered as a file download.
pub fn attachment(filename: &str, bytes: Vec<u8>) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename={}", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        encode(self.status_code(), &Envelope::error(self.to_string()))
    }
}
