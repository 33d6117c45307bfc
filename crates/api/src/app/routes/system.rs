use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// Liveness probe; does not touch the stores.
pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
