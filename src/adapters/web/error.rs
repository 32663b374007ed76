//! JSON error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::error::SpottraderError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &SpottraderError) -> StatusCode {
    match err {
        SpottraderError::UnsupportedTimeframe { .. }
        | SpottraderError::UnsupportedFillMethod { .. }
        | SpottraderError::MissingTimestampColumn { .. }
        | SpottraderError::MissingColumn { .. }
        | SpottraderError::MissingValue { .. } => StatusCode::BAD_REQUEST,
        SpottraderError::NoData { .. } => StatusCode::NOT_FOUND,
        SpottraderError::Upstream { .. }
        | SpottraderError::Database { .. }
        | SpottraderError::DatabaseQuery { .. }
        | SpottraderError::Io(_) => StatusCode::BAD_GATEWAY,
        SpottraderError::ConfigParse { .. }
        | SpottraderError::ConfigMissing { .. }
        | SpottraderError::ConfigInvalid { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SpottraderError> for WebError {
    fn from(err: SpottraderError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = self.status.as_u16(), error = %self.message, "request failed");
        }
        let body = ErrorBody {
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
