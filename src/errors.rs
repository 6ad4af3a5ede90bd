use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::core::client::results_transport::TransportError;

/// Longest slice of an upstream response body carried inside an error.
pub const BODY_SNIPPET_LIMIT: usize = 2_000;

/// Failures of one fetch-and-normalize invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Results API rejected the credentials (status {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Results API returned status {status} on page {page}: {body}")]
    Server { status: u16, page: usize, body: String },

    #[error("Transport failure on page {page}: {source}")]
    Network {
        page: usize,
        #[source]
        source: TransportError,
    },

    #[error("Malformed response on page {page}: {message}")]
    Protocol { page: usize, message: String },
}

impl PipelineError {
    /// Classify a non-success HTTP status from the results endpoint.
    pub fn from_status(status: u16, page: usize, body: &str) -> Self {
        let body = snippet(body);
        match status {
            401 | 403 => PipelineError::Auth { status, body },
            _ => PipelineError::Server { status, page, body },
        }
    }

    /// A 4xx other than 401/403: the endpoint refused the request shape.
    pub fn is_request_rejected(&self) -> bool {
        matches!(self, PipelineError::Server { status, .. } if (400..500).contains(status))
    }
}

/// Char-boundary safe truncation of a response body for error messages.
pub fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LIMIT) {
        Some((idx, _)) => format!("{}...<truncated>", &body[..idx]),
        None => body.to_string(),
    }
}

/// Lookups against the session's current table.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No query has completed yet")]
    NoSnapshot,

    #[error("Probe {0} has no records in the current table")]
    ProbeNotFound(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream API error: {0}")]
    UpstreamError(String),

    #[error("Upstream API unreachable: {0}")]
    UpstreamUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Helper for mapping any unknown error into internal error
pub fn internal_error<E: ToString>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::Config(_) => AppError::BadRequest(message),
            PipelineError::Auth { .. }
            | PipelineError::Server { .. }
            | PipelineError::Protocol { .. } => AppError::UpstreamError(message),
            PipelineError::Network { .. } => AppError::UpstreamUnavailable(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<PipelineError>() {
            Ok(pipeline) => return pipeline.into(),
            Err(other) => other,
        };
        let err = match err.downcast::<SessionError>() {
            Ok(missing) => return AppError::NotFound(missing.to_string()),
            Err(other) => other,
        };
        match err.downcast::<validator::ValidationErrors>() {
            Ok(validation) => AppError::BadRequest(validation.to_string()),
            Err(other) => internal_error(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Choose status codes per variant
        let status = match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamUnavailable(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // String provided by thiserror → safe JSON message
        let body = Json(json!({
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_are_not_server_errors() {
        assert!(matches!(
            PipelineError::from_status(401, 1, "nope"),
            PipelineError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            PipelineError::from_status(500, 3, "boom"),
            PipelineError::Server { status: 500, page: 3, .. }
        ));
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let body = "é".repeat(BODY_SNIPPET_LIMIT + 10);
        let cut = snippet(&body);
        assert!(cut.ends_with("...<truncated>"));
        assert_eq!(cut.chars().filter(|c| *c == 'é').count(), BODY_SNIPPET_LIMIT);
    }

    #[test]
    fn anyhow_wrapped_pipeline_error_keeps_its_status() {
        let err: anyhow::Error = PipelineError::Config("no programs".into()).into();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::BadRequest(_)));
        assert_eq!(app.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn only_plain_client_errors_count_as_rejections() {
        assert!(PipelineError::from_status(400, 1, "unknown field").is_request_rejected());
        assert!(PipelineError::from_status(422, 1, "").is_request_rejected());
        assert!(!PipelineError::from_status(401, 1, "").is_request_rejected());
        assert!(!PipelineError::from_status(500, 1, "").is_request_rejected());
    }

    #[test]
    fn missing_data_is_not_found() {
        let err: anyhow::Error = SessionError::ProbeNotFound("42".into()).into();
        let app: AppError = err.into();
        assert_eq!(app.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn transport_failures_map_to_gateway_timeout() {
        let err = PipelineError::Network { page: 2, source: TransportError("reset".into()) };
        assert_eq!(std::error::Error::source(&err).map(|s| s.to_string()), Some("reset".to_string()));
        let app: AppError = err.into();
        assert_eq!(app.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let app: AppError = PipelineError::from_status(503, 1, "down").into();
        assert_eq!(app.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
