use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ConfigError
///
/// Raised by `AppConfig::load` when the environment describes a configuration the
/// gate cannot safely run with. Start-up fails fast on any of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set when APP_ENV=production")]
    MissingVar(&'static str),

    #[error("{var} must be an absolute path starting with '/', got {value:?}")]
    InvalidPath { var: &'static str, value: String },

    #[error("{var} is not valid: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// TokenError
///
/// Diagnostic taxonomy for session token decoding. The gate never acts on the
/// distinction: every variant collapses to "unauthenticated" before the policy
/// table is consulted. Messages never include token contents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("no session token present")]
    Missing,

    #[error("session token is malformed")]
    Malformed,

    #[error("session token expired")]
    Expired,

    #[error("session token signature is invalid")]
    InvalidSignature,
}

/// PathError
///
/// A request path the gate refuses to interpret. Answered with `400 Bad Request`
/// before any cookie is read, so an ambiguous path can never be classified one way
/// and served another.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("request path is not valid UTF-8 once percent-decoded")]
    InvalidEncoding,

    #[error("request path contains an encoded path separator")]
    EncodedSeparator,

    #[error("request path contains a control character")]
    ControlCharacter,
}

/// ProxyError
///
/// Failures while forwarding an allowed request to the upstream page renderer.
/// Upstream failures surface as `502 Bad Gateway`; problems with the client's own
/// request get a 4xx.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("request body could not be read: {0}")]
    Body(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("request path {0:?} does not survive url resolution unchanged")]
    NonCanonicalPath(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream url is invalid: {0}")]
    InvalidUrl(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ProxyError::PayloadTooLarge { .. } => {
                tracing::debug!(target: "edge_gate.upstream", error = %self, "Request body rejected");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    "The request body is too large",
                )
            }
            ProxyError::NonCanonicalPath(_) => {
                tracing::debug!(target: "edge_gate.upstream", error = %self, "Request path rejected");
                (
                    StatusCode::BAD_REQUEST,
                    "BAD_REQUEST",
                    "The request path is not in canonical form",
                )
            }
            ProxyError::Body(_) | ProxyError::Upstream(_) | ProxyError::InvalidUrl(_) => {
                // Log the real cause server-side, return a generic body.
                tracing::error!(target: "edge_gate.upstream", error = %self, "Forwarding to upstream failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "BAD_GATEWAY",
                    "The page could not be fetched from the upstream service",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}
