use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use std::sync::Arc;

use ar_notes::store::{RemoteStore, StorePath};

use super::models::error_response;

pub async fn get_document(
    State(store): State<Arc<dyn RemoteStore>>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    let path = match StorePath::parse(&path) {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match store.get(&path) {
        Ok(value) => (StatusCode::OK, Json(value.unwrap_or(Value::Null))).into_response(),
        Err(e) => {
            tracing::error!(path = %path, "Read failed: {}", e);
            error_response(e)
        }
    }
}

pub async fn put_document(
    State(store): State<Arc<dyn RemoteStore>>,
    Path(path): Path<String>,
    Json(value): Json<Value>,
) -> impl IntoResponse {
    let path = match StorePath::parse(&path) {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match store.set(&path, value) {
        Ok(()) => {
            tracing::debug!(path = %path, "Document written");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::error!(path = %path, "Write failed: {}", e);
            error_response(e)
        }
    }
}
