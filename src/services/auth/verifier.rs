use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::v1::extractors::{AuthCtx, Claims};
use crate::error::AuthError;

/// Read-only verification settings, built once at startup and shared by
/// reference.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct VerificationConfig {
    pub secret_key: String,
    pub authorized_parties: Vec<String>,
    pub jwt_key: Option<String>,
}

impl VerificationConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            authorized_parties: Vec::new(),
            jwt_key: None,
        }
    }
}

impl fmt::Debug for VerificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationConfig")
            .field("secret_key", &"[REDACTED]")
            .field("authorized_parties", &self.authorized_parties)
            .field("jwt_key", &self.jwt_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Why the identity provider refused a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Expired,
    NotYetValid,
    BadSignature,
    UnauthorizedParty,
    KeyNotFound,
    KeySource,
    Malformed,
    Rejected,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason:?}: {detail}")]
pub struct OracleError {
    pub reason: FailureReason,
    pub detail: String,
}

impl OracleError {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

/// Identity provider capability: credential in, claims out.
///
/// Implementations own transport, caching and retries. The gate calls
/// `verify` at most once per request.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str, config: &VerificationConfig)
    -> Result<Claims, OracleError>;
}

/// Verify `token` through `verifier` and map the outcome.
///
/// Expiry becomes `TOKEN_EXPIRED`; every other oracle failure, and a claim
/// set without a subject, becomes `INVALID_TOKEN`.
pub async fn verify_credential(
    verifier: &dyn TokenVerifier,
    token: &str,
    config: &VerificationConfig,
) -> Result<AuthCtx, AuthError> {
    let claims = match verifier.verify(token, config).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(reason = ?err.reason, detail = %err.detail, "token verification failed");
            return Err(classify(&err));
        }
    };

    AuthCtx::from_claims(claims).map_err(|err| {
        tracing::warn!(error = %err, "verified claims are unusable");
        AuthError::invalid_token()
    })
}

fn classify(err: &OracleError) -> AuthError {
    match err.reason {
        FailureReason::Expired => AuthError::token_expired(),
        _ => AuthError::invalid_token(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    struct Fixed(Result<serde_json::Value, OracleError>);

    #[async_trait]
    impl TokenVerifier for Fixed {
        async fn verify(
            &self,
            _token: &str,
            _config: &VerificationConfig,
        ) -> Result<Claims, OracleError> {
            match &self.0 {
                Ok(serde_json::Value::Object(map)) => Ok(map.clone()),
                Ok(_) => Err(OracleError::new(FailureReason::Malformed, "not an object")),
                Err(e) => Err(e.clone()),
            }
        }
    }

    fn config() -> VerificationConfig {
        VerificationConfig::new("sk_test")
    }

    #[tokio::test]
    async fn maps_claims_on_success() {
        let verifier = Fixed(Ok(json!({ "sub": "user_1", "sid": "sess_1" })));
        let ctx = verify_credential(&verifier, "tok", &config()).await.unwrap();
        assert_eq!(ctx.user_id(), "user_1");
        assert_eq!(ctx.session_id(), "sess_1");
    }

    #[tokio::test]
    async fn expiry_maps_to_token_expired() {
        let verifier = Fixed(Err(OracleError::new(FailureReason::Expired, "exp passed")));
        let err = verify_credential(&verifier, "tok", &config()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[tokio::test]
    async fn every_other_reason_maps_to_invalid_token() {
        for reason in [
            FailureReason::NotYetValid,
            FailureReason::BadSignature,
            FailureReason::UnauthorizedParty,
            FailureReason::KeyNotFound,
            FailureReason::KeySource,
            FailureReason::Malformed,
            FailureReason::Rejected,
        ] {
            let verifier = Fixed(Err(OracleError::new(reason, "nope")));
            let err = verify_credential(&verifier, "tok", &config()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidToken, "{reason:?}");
            assert_eq!(err.message(), "Invalid token");
        }
    }

    #[tokio::test]
    async fn claims_without_subject_are_invalid() {
        let verifier = Fixed(Ok(json!({ "sid": "sess_1" })));
        let err = verify_credential(&verifier, "tok", &config()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToken);
    }

    #[test]
    fn debug_redacts_secret_and_key() {
        let mut config = VerificationConfig::new("sk_live_secret");
        config.jwt_key = Some("-----BEGIN PUBLIC KEY-----".into());
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk_live_secret"));
        assert!(!printed.contains("BEGIN PUBLIC KEY"));
    }
}
