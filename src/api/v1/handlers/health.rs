/*
 * Responsibility
 * - GET /health (疎通用)
 * - public route: 認証 middleware を素通りする
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
