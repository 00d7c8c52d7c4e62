/// Factory: build the `AuthGate` (and its `JwtVerifier`) from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::DecodingKey;

use crate::config::{Config, ConfigError};
use crate::middleware::auth::{AuthGate, RouteTable};
use crate::services::auth::{JwksClient, JwtVerifier};

pub fn build_auth_gate(config: &Config, routes: RouteTable) -> Result<Arc<AuthGate>, ConfigError> {
    // A bad offline key is a startup error, not a stream of INVALID_TOKENs.
    if let Some(pem) = config.auth_jwt_key.as_deref() {
        DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|err| {
            tracing::error!(error = %err, "AUTH_JWT_KEY is not a valid RSA public key");
            ConfigError::Invalid("AUTH_JWT_KEY")
        })?;
    }

    let jwks = JwksClient::new(
        &config.auth_api_url,
        Duration::from_secs(config.auth_jwks_cache_ttl_seconds),
    )
    .map_err(|err| {
        tracing::error!(error = %err, api_url = %config.auth_api_url, "cannot build jwks client");
        ConfigError::Invalid("AUTH_API_URL")
    })?;

    let verifier = JwtVerifier::new(jwks, Duration::from_secs(config.auth_clock_skew_seconds));

    let gate = AuthGate::builder()
        .secret_key(config.auth_secret_key.clone())
        .authorized_parties(config.auth_authorized_parties.clone())
        .jwt_key(config.auth_jwt_key.clone())
        .public_routes(config.auth_public_routes)
        .routes(routes)
        .on_failure(|err, req| {
            tracing::info!(
                code = %err.kind(),
                method = %req.method(),
                uri = %req.uri(),
                "rejected request"
            );
        })
        .build(Arc::new(verifier))?;

    Ok(Arc::new(gate))
}
