/*
 * Responsibility
 * - GET /me: 認証済みユーザーのコンテキストをそのまま返す
 */
use axum::Json;

use crate::api::v1::{dto::me::MeResponse, extractors::CurrentUser};

pub async fn me(CurrentUser(ctx): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse::from(&ctx))
}
