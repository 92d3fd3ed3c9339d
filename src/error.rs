//! Error type shared by routing, fetching and the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    /// Missing or malformed request parameter
    #[error("{message}")]
    Validation {
        field: String,
        message: String,
        allowed: Option<Vec<String>>,
    },

    /// No credential configured under the requested name
    #[error("no credential configured for '{name}'")]
    CredentialMissing { name: String, available: Vec<String> },

    /// Connection failure, DNS failure or timeout
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned status {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("no route for {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ProxyError {
    pub fn missing(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: format!("missing required parameter '{}'", field),
            allowed: None,
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
            allowed: None,
        }
    }

    pub fn invalid_choice(field: &str, message: impl Into<String>, allowed: Vec<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
            allowed: Some(allowed),
        }
    }

    /// Build from a reqwest error with the URL stripped, since it may carry a credential.
    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("timed out: {}", err.without_url()))
        } else {
            Self::Transport(err.without_url().to_string())
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::CredentialMissing { .. } => 400,
            Self::MethodNotAllowed(_) => 405,
            Self::NotFound(_) => 404,
            Self::Transport(_) | Self::Internal(_) => 500,
            Self::UpstreamStatus { status, .. } => *status,
        }
    }

    fn body(&self) -> Value {
        let status = self.status_code();
        let mut body = json!({
            "success": false,
            "status": status,
            "error": self.to_string(),
        });

        match self {
            Self::Validation { field, allowed, .. } => {
                body["field"] = json!(field);
                if let Some(allowed) = allowed {
                    body["allowed"] = json!(allowed);
                }
            }
            Self::CredentialMissing { available, .. } => {
                body["available"] = json!(available);
            }
            Self::UpstreamStatus { body: raw, .. } => {
                body["error"] = json!(format!("upstream returned status {}: {}", status, raw));
                body["data"] = json!(raw);
            }
            Self::MethodNotAllowed(_)
            | Self::NotFound(_)
            | Self::Transport(_)
            | Self::Internal(_) => {}
        }

        body
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, "proxy request failed");
        } else {
            tracing::debug!(error = %self, "proxy request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
