use axum::{Json, body::Body, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;

use ar_notes::error::NoteError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn internal(e: impl std::fmt::Display) -> Response<Body> {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(Self::new(e.to_string()))).into_response()
    }

    pub fn bad_request(message: impl Into<String>) -> Response<Body> {
        (StatusCode::BAD_REQUEST, Json(Self::new(message))).into_response()
    }
}

/// Map a store-layer error to the matching HTTP response.
pub fn error_response(e: NoteError) -> Response<Body> {
    match e {
        NoteError::InvalidPath { .. } => ErrorResponse::bad_request(e.to_string()),
        _ => ErrorResponse::internal(e),
    }
}
