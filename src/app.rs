/*
 * Responsibility
 * - Config読み込み → tracing 初期化 → AuthGate 生成 → Router 組み立て
 * - Middleware の適用 (認証ゲート / HTTP 共通)
 * - axum::serve() で起動
 */
use anyhow::Result;
use axum::Router;
use tracing_subscriber::EnvFilter;

use crate::{
    api,
    config::{AppEnv, Config},
    middleware::{self, http::HttpLimits},
    services::auth::build_auth_gate,
    state::AppState,
};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.app_env);

    tracing::info!(?config, "configuration loaded");

    let gate = build_auth_gate(&config, api::v1::route_table())?;
    let state = AppState::new(gate);

    let app = build_router(
        state,
        HttpLimits {
            timeout: config.request_timeout,
            body_limit: config.request_body_limit,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState, limits: HttpLimits) -> Router {
    let app = Router::new().nest(api::v1::PREFIX, api::v1::routes());
    // Gate goes on after nesting so MatchedPath carries the full pattern.
    let app = middleware::auth::apply(app, state.gate.clone()).with_state(state);

    middleware::http::apply(app, limits)
}

fn init_tracing(app_env: AppEnv) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!app_env.is_production())
        .init();
}
