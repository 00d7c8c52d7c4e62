/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 権限ガードは route_layer で掛ける (認証ゲートは app 側で全体に掛ける)
 * - public route の一覧 (RouteTable) もここで決める
 */
use axum::{Router, middleware::from_fn_with_state, routing::get};

use crate::middleware::auth::{
    RouteTable, enforce, require_org_role, require_role, require_scopes,
};
use crate::state::AppState;

use crate::api::v1::handlers::{
    admin::{dashboard, org_members, org_settings, reports},
    health::health,
    me::me,
};

pub const PREFIX: &str = "/api/v1";

pub fn routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/admin", get(dashboard))
        .route_layer(from_fn_with_state(require_role("admin"), enforce));

    let reporting = Router::new()
        .route("/reports", get(reports))
        .route_layer(from_fn_with_state(require_scopes(["reports:read"]), enforce));

    let org_admin = Router::new()
        .route("/org/settings", get(org_settings))
        .route_layer(from_fn_with_state(require_org_role("admin"), enforce));

    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/org/members", get(org_members))
        .merge(admin)
        .merge(reporting)
        .merge(org_admin)
}

/// Route patterns as seen after nesting under `PREFIX`.
pub fn route_table() -> RouteTable {
    RouteTable::new().public(format!("{PREFIX}/health"))
}
