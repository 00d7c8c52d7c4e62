use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, jwk::Jwk};
use serde_json::Value;

use crate::api::v1::extractors::Claims;
use crate::services::auth::jwks::JwksClient;
use crate::services::auth::verifier::{
    FailureReason, OracleError, TokenVerifier, VerificationConfig,
};

/// RS256 session-token verifier.
///
/// With `VerificationConfig::jwt_key` set, tokens are checked against that
/// PEM key and no network call is made. Otherwise the signing key is looked
/// up by `kid` in the provider JWKS.
///
/// `jsonwebtoken::Validation` checks:
/// - signature
/// - `exp` (required) and `nbf` (when present), with clock-skew leeway
///
/// This type additionally checks `azp` against the authorized parties.
pub struct JwtVerifier {
    jwks: JwksClient,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("jwks", &self.jwks)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(jwks: JwksClient, clock_skew: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = clock_skew.as_secs();
        validation.validate_nbf = true;
        // Session tokens carry `azp`, not `aud`.
        validation.validate_aud = false;

        Self { jwks, validation }
    }

    async fn decoding_key(
        &self,
        kid: Option<&str>,
        config: &VerificationConfig,
    ) -> Result<DecodingKey, OracleError> {
        if let Some(pem) = config.jwt_key.as_deref() {
            return DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| OracleError::new(FailureReason::KeySource, e.to_string()));
        }

        let kid = kid.ok_or_else(|| {
            OracleError::new(FailureReason::KeyNotFound, "token header has no kid")
        })?;

        let keys = self
            .jwks
            .keys(&config.secret_key)
            .await
            .map_err(|e| OracleError::new(FailureReason::KeySource, e.to_string()))?;
        if let Some(jwk) = keys.find(kid) {
            return key_from_jwk(jwk);
        }
        tracing::debug!(kid, "kid not in jwks, refreshing");

        let keys = self
            .jwks
            .refresh(&config.secret_key)
            .await
            .map_err(|e| OracleError::new(FailureReason::KeySource, e.to_string()))?;

        match keys.find(kid) {
            Some(jwk) => key_from_jwk(jwk),
            None => Err(OracleError::new(
                FailureReason::KeyNotFound,
                format!("no jwk with kid '{kid}'"),
            )),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(
        &self,
        token: &str,
        config: &VerificationConfig,
    ) -> Result<Claims, OracleError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| OracleError::new(FailureReason::Malformed, e.to_string()))?;

        let key = self.decoding_key(header.kid.as_deref(), config).await?;

        let data = jsonwebtoken::decode::<Claims>(token, &key, &self.validation)
            .map_err(|e| OracleError::new(reason_for(e.kind()), e.to_string()))?;

        check_authorized_party(&data.claims, &config.authorized_parties)?;

        Ok(data.claims)
    }
}

fn key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, OracleError> {
    DecodingKey::from_jwk(jwk).map_err(|e| OracleError::new(FailureReason::KeySource, e.to_string()))
}

fn reason_for(kind: &JwtErrorKind) -> FailureReason {
    match kind {
        JwtErrorKind::ExpiredSignature => FailureReason::Expired,
        JwtErrorKind::ImmatureSignature => FailureReason::NotYetValid,
        JwtErrorKind::InvalidSignature => FailureReason::BadSignature,
        JwtErrorKind::InvalidToken
        | JwtErrorKind::Base64(_)
        | JwtErrorKind::Json(_)
        | JwtErrorKind::Utf8(_) => FailureReason::Malformed,
        _ => FailureReason::Rejected,
    }
}

/// An `azp` outside a non-empty allow-list is rejected. Tokens without `azp`
/// pass.
fn check_authorized_party(claims: &Claims, authorized: &[String]) -> Result<(), OracleError> {
    if authorized.is_empty() {
        return Ok(());
    }

    match claims.get("azp").and_then(Value::as_str) {
        Some(azp) if !authorized.iter().any(|p| p == azp) => Err(OracleError::new(
            FailureReason::UnauthorizedParty,
            format!("azp '{azp}' is not an authorized party"),
        )),
        _ => Ok(()),
    }
}
