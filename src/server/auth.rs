//! Provider API key validation.
//!
//! Protected routes check the `X-Provider-Api-Key` header against the
//! configured key. Failures render as a 401 with an OpenAI-style error envelope.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::warn;

use crate::server::openai_api::{ErrorBody, ErrorEnvelope};

/// Header carrying the caller's provider API key.
pub const API_KEY_HEADER: &str = "x-provider-api-key";

/// Keys shorter than this are fully masked when echoed back.
const MIN_REDACTABLE_CHARS: usize = 8;

/// Characters kept from each end of a redacted key.
const VISIBLE_CHARS: usize = 4;

const MASK: &str = "***";

/// Authentication failures for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing API key. Set X-Provider-Api-Key header.")]
    MissingKey,

    #[error("Invalid API key provided: {redacted}")]
    InvalidKey { redacted: String },
}

impl AuthError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingKey => "missing_api_key",
            AuthError::InvalidKey { .. } => "invalid_api_key",
        }
    }

    /// The JSON envelope for this error.
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                message: self.to_string(),
                r#type: "authentication_error".to_string(),
                code: self.code().to_string(),
            },
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        warn!(code = self.code(), "Authentication failed");
        (StatusCode::UNAUTHORIZED, Json(self.envelope())).into_response()
    }
}

/// Validate the request's credential header against `expected`.
///
/// An empty header value counts as missing. Comparison is an exact byte match,
/// so UTF-8 keys work even though they are not visible ASCII.
pub fn validate(headers: &HeaderMap, expected: &str) -> Result<(), AuthError> {
    let Some(value) = headers.get(API_KEY_HEADER) else {
        return Err(AuthError::MissingKey);
    };
    if value.is_empty() {
        return Err(AuthError::MissingKey);
    }

    if value.as_bytes() == expected.as_bytes() {
        return Ok(());
    }

    let redacted = match std::str::from_utf8(value.as_bytes()) {
        Ok(key) => redact_key(key),
        Err(_) => MASK.to_string(),
    };
    Err(AuthError::InvalidKey { redacted })
}

/// Redact a key to its first and last four characters, e.g. `sk-t...-key`.
///
/// Keys under eight characters would be echoed almost verbatim, so they are
/// replaced with a fixed mask instead.
pub fn redact_key(key: &str) -> String {
    let len = key.chars().count();
    if len < MIN_REDACTABLE_CHARS {
        return MASK.to_string();
    }

    let head: String = key.chars().take(VISIBLE_CHARS).collect();
    let tail: String = key.chars().skip(len - VISIBLE_CHARS).collect();
    format!("{head}...{tail}")
}
