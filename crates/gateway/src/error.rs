//! HTTP error responses.
//!
//! Every failure leaves the gateway as `{ "detail": "..." }` with a status
//! chosen by the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use kbchat_core::Error;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(id) => Self::new(StatusCode::NOT_FOUND, format!("Chat not found: {id}")),
            Error::ModelGenerationFailure(_) => Self::new(StatusCode::BAD_GATEWAY, "AI provider error"),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
