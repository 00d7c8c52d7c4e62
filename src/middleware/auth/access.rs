//! Authentication gate: credential → verification → AuthCtx in extensions.
//!
//! Per request:
//! - public route (and recognition enabled) → pass through, nothing attached
//! - no credential → `UNAUTHORIZED`
//! - verifier failure → `TOKEN_EXPIRED` / `INVALID_TOKEN`
//! - success → `AuthCtx` inserted into request extensions
//!
//! Failures are returned as `AuthError`, whose `IntoResponse` renders the JSON
//! error body. Handlers and guards downstream return the same type, so every
//! auth failure in the request goes through that one mapping.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::config::ConfigError;
use crate::error::AuthError;
use crate::middleware::auth::credential::extract_credential;
use crate::services::auth::{TokenVerifier, VerificationConfig, verify_credential};

/// Called with the error and the request whenever authentication fails.
/// Never called for public routes or successful requests.
pub type FailureObserver = Arc<dyn Fn(&AuthError, &Request) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteConfig {
    pub public: bool,
}

impl RouteConfig {
    pub fn public() -> Self {
        Self { public: true }
    }
}

/// Per-route settings keyed by route pattern (as seen by `MatchedPath`,
/// including any `nest` prefix). Unknown routes use `RouteConfig::default()`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteConfig>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, pattern: impl Into<String>, config: RouteConfig) -> Self {
        self.routes.insert(pattern.into(), config);
        self
    }

    pub fn public(self, pattern: impl Into<String>) -> Self {
        self.route(pattern, RouteConfig::public())
    }

    pub fn get(&self, pattern: &str) -> RouteConfig {
        self.routes.get(pattern).copied().unwrap_or_default()
    }
}

pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    config: Arc<VerificationConfig>,
    routes: RouteTable,
    public_routes: bool,
    on_failure: Option<FailureObserver>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .field("public_routes", &self.public_routes)
            .field("on_failure", &self.on_failure.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn builder() -> AuthGateBuilder {
        AuthGateBuilder::default()
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Whether the matched route bypasses authentication.
    pub fn is_public(&self, matched_path: Option<&str>) -> bool {
        self.public_routes && matched_path.is_some_and(|path| self.routes.get(path).public)
    }

    /// Extraction + verification for one request.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthCtx, AuthError> {
        let Some(credential) = extract_credential(headers) else {
            tracing::debug!("no credential on request");
            return Err(AuthError::unauthorized());
        };

        tracing::debug!(source = ?credential.source, "credential found");
        verify_credential(self.verifier.as_ref(), &credential.token, &self.config).await
    }

    /// Side-channel notification only; never changes the outcome.
    pub fn report_failure(&self, err: &AuthError, req: &Request) {
        if let Some(observer) = &self.on_failure {
            observer(err, req);
        }
    }
}

/// Registration-time options. `build` fails without a secret key.
pub struct AuthGateBuilder {
    secret_key: Option<String>,
    authorized_parties: Vec<String>,
    jwt_key: Option<String>,
    routes: RouteTable,
    public_routes: bool,
    on_failure: Option<FailureObserver>,
}

impl Default for AuthGateBuilder {
    fn default() -> Self {
        Self {
            secret_key: None,
            authorized_parties: Vec::new(),
            jwt_key: None,
            routes: RouteTable::default(),
            public_routes: true,
            on_failure: None,
        }
    }
}

impl AuthGateBuilder {
    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn authorized_parties(mut self, parties: Vec<String>) -> Self {
        self.authorized_parties = parties;
        self
    }

    pub fn jwt_key(mut self, pem: Option<String>) -> Self {
        self.jwt_key = pem;
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Disable to authenticate every route regardless of its `public` marker.
    pub fn public_routes(mut self, enabled: bool) -> Self {
        self.public_routes = enabled;
        self
    }

    pub fn on_failure<F>(mut self, observer: F) -> Self
    where
        F: Fn(&AuthError, &Request) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(observer));
        self
    }

    pub fn build(self, verifier: Arc<dyn TokenVerifier>) -> Result<AuthGate, ConfigError> {
        let secret_key = self
            .secret_key
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("secret_key"))?;

        let config = VerificationConfig {
            secret_key,
            authorized_parties: self.authorized_parties,
            jwt_key: self.jwt_key,
        };

        Ok(AuthGate {
            verifier,
            config: Arc::new(config),
            routes: self.routes,
            public_routes: self.public_routes,
            on_failure: self.on_failure,
        })
    }
}

/// Router に認証を掛けるための middleware を適用する。
/// nest 後に掛けること (RouteTable は prefix 込みの pattern で引く)
///
/// 例：
/// ```ignore
/// let app = Router::new().nest("/api/v1", api::v1::routes());
/// let app = middleware::auth::access::apply(app, gate.clone());
/// ```
pub fn apply<S>(router: Router<S>, gate: Arc<AuthGate>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // Router::layer runs after routing, so MatchedPath is available.
    router.layer(middleware::from_fn_with_state(gate, access_middleware))
}

async fn access_middleware(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let matched = req.extensions().get::<MatchedPath>().map(|m| m.as_str());

    if gate.is_public(matched) {
        tracing::debug!(route = ?matched, "public route, skipping authentication");
        return Ok(next.run(req).await);
    }

    let auth_ctx = match gate.authenticate(req.headers()).await {
        Ok(ctx) => ctx,
        Err(err) => {
            gate.report_failure(&err, &req);
            return Err(err);
        }
    };
    tracing::debug!(user_id = %auth_ctx.user_id(), "request authenticated");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
