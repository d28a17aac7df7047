/// Role-gated probe endpoints and the health check.
use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> &'static str {
    "OK"
}

pub async fn admin_only() -> Json<Value> {
    Json(json!({ "message": "Welcome, Admin" }))
}

pub async fn user_only() -> Json<Value> {
    Json(json!({ "message": "Welcome, User" }))
}
