use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pdf_export::{EngineError, ExportError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid markdown content: {0}")]
    Validation(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("{what}: {message}")]
    Render {
        what: &'static str,
        message: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Validation(message) => Self::Validation(message),
            ExportError::Render(err) => {
                // Browser internals stay in the log.
                let message = match err {
                    EngineError::Timeout(_) => "PDF rendering timed out",
                    EngineError::ShutDown => "The server is shutting down",
                    _ => "PDF rendering failed",
                };
                Self::Render {
                    what: "Failed to generate PDF",
                    message: message.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message) = match &self {
            Self::Validation(message) => ("Invalid markdown content", message.as_str()),
            Self::PayloadTooLarge(message) => ("Payload too large", message.as_str()),
            Self::Render { what, message } => (*what, message.as_str()),
            Self::NotFound(message) => ("Not found", message.as_str()),
        };

        if status.is_server_error() {
            tracing::error!(%status, error, message, "Request failed");
        } else {
            tracing::debug!(%status, error, message, "Request rejected");
        }

        (status, Json(ErrorBody { error, message })).into_response()
    }
}
