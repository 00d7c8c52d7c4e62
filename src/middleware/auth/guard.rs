//! Permission guards over the attached `AuthCtx`.
//!
//! A guard is a predicate plus the message used when it fails. Guards run
//! after the authentication gate, either as a route layer:
//!
//! ```ignore
//! Router::new()
//!     .route("/admin", get(admin))
//!     .route_layer(from_fn_with_state(require_role("admin"), guard::enforce));
//! ```
//!
//! or inline in a handler via `Guard::check`.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Extensions,
    middleware::Next,
    response::Response,
};

use crate::api::v1::extractors::{AuthCtx, current_user};
use crate::error::AuthError;

type Predicate = dyn Fn(&AuthCtx) -> bool + Send + Sync;

#[derive(Clone)]
pub struct Guard {
    predicate: Arc<Predicate>,
    message: Arc<str>,
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Guard {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `UNAUTHORIZED` without an identity (the custom message is not used),
    /// `FORBIDDEN` with the guard's message when the predicate is false.
    pub fn check(&self, ctx: Option<&AuthCtx>) -> Result<(), AuthError> {
        let ctx = ctx.ok_or_else(AuthError::unauthorized)?;
        if (self.predicate)(ctx) {
            Ok(())
        } else {
            Err(AuthError::forbidden(self.message.to_string()))
        }
    }

    pub fn check_extensions(&self, extensions: &Extensions) -> Result<(), AuthError> {
        self.check(current_user(extensions).ok())
    }
}

pub fn require_permission<F>(predicate: F, message: impl Into<String>) -> Guard
where
    F: Fn(&AuthCtx) -> bool + Send + Sync + 'static,
{
    let message: String = message.into();
    Guard {
        predicate: Arc::new(predicate),
        message: Arc::from(message),
    }
}

/// Caller's `public_metadata.roles` contains `role`.
pub fn require_role(role: impl Into<String>) -> Guard {
    let role = role.into();
    let message = format!("Role '{role}' required");
    require_permission(move |ctx| ctx.roles().any(|r| r == role.as_str()), message)
}

/// Every one of `scopes` is in the caller's `public_metadata.scopes`. An
/// empty list always passes.
pub fn require_scopes<I, T>(scopes: I) -> Guard
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let scopes: Vec<String> = scopes.into_iter().map(Into::into).collect();
    let message = format!("Scopes '{}' required", scopes.join(", "));
    require_permission(
        move |ctx| {
            scopes
                .iter()
                .all(|wanted| ctx.scopes().any(|granted| granted == wanted.as_str()))
        },
        message,
    )
}

pub fn require_org_membership() -> Guard {
    require_permission(
        |ctx| ctx.org_id().is_some(),
        "Organization membership required",
    )
}

/// Exact match on the caller's organization role; no role never matches.
pub fn require_org_role(role: impl Into<String>) -> Guard {
    let role = role.into();
    let message = format!("Organization role '{role}' required");
    require_permission(move |ctx| ctx.org_role() == Some(role.as_str()), message)
}

/// Route-layer adapter: `from_fn_with_state(guard, enforce)`.
pub async fn enforce(
    State(guard): State<Guard>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(err) = guard.check_extensions(req.extensions()) {
        tracing::debug!(code = %err.kind(), reason = %err.message(), "guard rejected request");
        return Err(err);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1::extractors::Metadata;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn metadata(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    fn user() -> AuthCtx {
        AuthCtx::new("user_1", "sess_1").unwrap()
    }

    fn with_public(value: serde_json::Value) -> AuthCtx {
        user().with_public_metadata(metadata(value))
    }

    #[test]
    fn missing_identity_is_unauthorized_not_forbidden() {
        let guard = require_permission(|_| true, "custom message");
        let err = guard.check(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "Authentication required");
    }

    #[test]
    fn false_predicate_is_forbidden_with_message() {
        let guard = require_permission(|ctx| ctx.email().is_some(), "Email required");
        let err = guard.check(Some(&user())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), "Email required");

        assert!(guard.check(Some(&user().with_email("a@example.com"))).is_ok());
    }

    #[test]
    fn role_guard() {
        let guard = require_role("admin");
        assert!(guard.check(Some(&with_public(json!({ "roles": ["admin", "dev"] })))).is_ok());

        let err = guard
            .check(Some(&with_public(json!({ "roles": ["dev"] }))))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), "Role 'admin' required");

        assert!(guard.check(Some(&user())).is_err());
        assert!(guard.check(Some(&with_public(json!({ "roles": [] })))).is_err());
    }

    #[test]
    fn empty_scope_list_always_passes() {
        let guard = require_scopes(Vec::<String>::new());
        assert!(guard.check(Some(&user())).is_ok());
        assert!(guard.check(Some(&with_public(json!({ "scopes": [] })))).is_ok());
    }

    #[test]
    fn scope_guard_requires_every_scope() {
        let guard = require_scopes(["read", "write"]);
        assert!(
            guard
                .check(Some(&with_public(json!({ "scopes": ["write", "read", "admin"] }))))
                .is_ok()
        );

        let err = guard
            .check(Some(&with_public(json!({ "scopes": ["read"] }))))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), "Scopes 'read, write' required");

        assert!(guard.check(Some(&user())).is_err());
    }

    #[test]
    fn org_membership_guard() {
        let guard = require_org_membership();
        assert!(guard.check(Some(&user().with_org("org_1", None, None))).is_ok());

        let err = guard.check(Some(&user())).unwrap_err();
        assert_eq!(err.message(), "Organization membership required");
    }

    #[test]
    fn org_role_guard_matches_exactly() {
        let guard = require_org_role("admin");
        assert!(
            guard
                .check(Some(&user().with_org("org_1", Some("admin"), None)))
                .is_ok()
        );

        let err = guard
            .check(Some(&user().with_org("org_1", Some("member"), None)))
            .unwrap_err();
        assert_eq!(err.message(), "Organization role 'admin' required");

        assert!(guard.check(Some(&user().with_org("org_1", Some("Admin"), None))).is_err());
        assert!(guard.check(Some(&user().with_org("org_1", None, None))).is_err());
        assert!(guard.check(Some(&user())).is_err());
    }

    #[test]
    fn guards_read_extensions() {
        let guard = require_role("admin");

        let mut extensions = Extensions::new();
        assert_eq!(
            guard.check_extensions(&extensions).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );

        extensions.insert(with_public(json!({ "roles": ["admin"] })));
        assert!(guard.check_extensions(&extensions).is_ok());
    }
}
