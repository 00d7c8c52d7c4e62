/*
 * Responsibility
 * - 権限ガード付きの handler 群
 * - ガードは routes 側の route_layer、もしくは handler 内で Guard::check
 */
use axum::Json;
use serde_json::{Value, json};

use crate::api::v1::extractors::CurrentUser;
use crate::error::AuthError;
use crate::middleware::auth::require_org_membership;

// route_layer: require_role("admin")
pub async fn dashboard(CurrentUser(ctx): CurrentUser) -> Json<Value> {
    Json(json!({ "area": "admin", "user_id": ctx.user_id() }))
}

// route_layer: require_scopes(["reports:read"])
pub async fn reports(CurrentUser(ctx): CurrentUser) -> Json<Value> {
    Json(json!({ "reports": [], "user_id": ctx.user_id() }))
}

// route_layer: require_org_role("admin")
pub async fn org_settings(CurrentUser(ctx): CurrentUser) -> Json<Value> {
    Json(json!({ "org_id": ctx.org_id(), "org_slug": ctx.org_slug() }))
}

pub async fn org_members(CurrentUser(ctx): CurrentUser) -> Result<Json<Value>, AuthError> {
    require_org_membership().check(Some(&ctx))?;

    Ok(Json(json!({
        "org_id": ctx.org_id(),
        "members": [{ "user_id": ctx.user_id(), "role": ctx.org_role() }],
    })))
}
