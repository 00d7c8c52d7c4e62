//! Raw bearer credential extraction.
//!
//! Sources, in priority order:
//! 1. `Authorization: Bearer <credential>` (case-sensitive scheme, one space)
//! 2. `__session` cookie
//!
//! The credential is opaque here; shape checks belong to the verifier.

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::Cookie;

pub const BEARER_PREFIX: &str = "Bearer ";
pub const SESSION_COOKIE: &str = "__session";

/// Where the credential was found. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Header,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub source: CredentialSource,
}

/// Returns `None` when neither source yields a value.
///
/// `Bearer ` followed by nothing yields an empty token; it is not treated as
/// missing and will be rejected by the verifier instead.
pub fn extract_credential(headers: &HeaderMap) -> Option<Credential> {
    if let Some(token) = bearer_token(headers) {
        return Some(Credential {
            token: token.to_string(),
            source: CredentialSource::Header,
        });
    }

    session_cookie(headers).map(|token| Credential {
        token,
        source: CredentialSource::Cookie,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
}

/// Raw cookie value, no percent-decoding. First `__session` wins across all
/// `Cookie` headers.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
