//! Error types for droid-api

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use droid_core::ErrorKind;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthFailed,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Core(#[from] droid_core::Error),
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthFailed => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::Cycle => StatusCode::BAD_REQUEST,
                ErrorKind::DuplicateName => StatusCode::CONFLICT,
                ErrorKind::UnknownTool | ErrorKind::UnknownAgent | ErrorKind::UnknownEntity => {
                    StatusCode::NOT_FOUND
                }
                ErrorKind::ToolExecution | ErrorKind::Generation => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let kind = match &self {
            Self::Core(e) => Some(e.kind()),
            Self::InvalidRequest(_) => Some(ErrorKind::Validation),
            Self::AuthFailed => None,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}

/// Malformed or incomplete JSON bodies are reported like any other
/// validation failure
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
