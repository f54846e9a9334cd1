//! HTTP mapping for [`AppError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::AppError;

impl AppError {
    /// Status code this error is reported with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Format(_) | Self::Schema(_) | Self::EmptyQuery => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Service(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Db(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the client: the bare message for client mistakes, the
    /// prefixed form otherwise.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Format(msg) => msg.clone(),
            Self::Schema(missing) => format!("Missing required columns: {}", missing.join(", ")),
            Self::PayloadTooLarge(limit) => {
                format!("File is too large. The upload limit is {limit} bytes.")
            }
            Self::EmptyQuery => "Please provide a question.".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(err = %self, "request failed");
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
