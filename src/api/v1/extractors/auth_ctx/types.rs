/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 署名検証やセッション検証は services/auth (TokenVerifier) の責務
 * - ここは claims → AuthCtx の写像と、不変条件 (sub 非空 / org_role は org_id とセット) を持つ
 */

use serde_json::{Map, Value};
use thiserror::Error;

/// Verified claim set, kept verbatim.
pub type Claims = Map<String, Value>;

/// Open-ended custom attributes (`public_metadata` / `private_metadata`).
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("missing or empty 'sub' claim")]
    MissingSubject,
}

/// Organization context of the caller. Role and slug only exist alongside an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgMembership {
    pub id: String,
    pub role: Option<String>,
    pub slug: Option<String>,
}

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は identity provider の subject (空文字にはならない)
/// - `session_id` は空文字もあり得る
/// - `claims` は provider が返した claim set そのもの
///
/// Fields are private: once built, a context is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthCtx {
    user_id: String,
    session_id: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
    org: Option<OrgMembership>,
    public_metadata: Metadata,
    private_metadata: Metadata,
    claims: Claims,
}

impl AuthCtx {
    /// Minimal context, for test doubles and custom verifiers.
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self, ClaimsError> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(ClaimsError::MissingSubject);
        }

        Ok(Self {
            user_id,
            session_id: session_id.into(),
            email: None,
            first_name: None,
            last_name: None,
            image_url: None,
            org: None,
            public_metadata: Metadata::new(),
            private_metadata: Metadata::new(),
            claims: Claims::new(),
        })
    }

    /// Map a verified claim set.
    ///
    /// Optional display/org fields fall back to `None` when absent or not a
    /// string; metadata maps fall back to empty.
    pub fn from_claims(claims: Claims) -> Result<Self, ClaimsError> {
        let user_id = string_claim(&claims, "sub").ok_or(ClaimsError::MissingSubject)?;
        let session_id = string_claim(&claims, "sid").unwrap_or_default();

        let mut ctx = Self::new(user_id, session_id)?;
        ctx.email = string_claim(&claims, "email");
        ctx.first_name = string_claim(&claims, "first_name");
        ctx.last_name = string_claim(&claims, "last_name");
        ctx.image_url = string_claim(&claims, "image_url");
        ctx.org = string_claim(&claims, "org_id").map(|id| OrgMembership {
            id,
            role: string_claim(&claims, "org_role"),
            slug: string_claim(&claims, "org_slug"),
        });
        ctx.public_metadata = object_claim(&claims, "public_metadata");
        ctx.private_metadata = object_claim(&claims, "private_metadata");
        ctx.claims = claims;

        Ok(ctx)
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_org(
        mut self,
        id: impl Into<String>,
        role: Option<&str>,
        slug: Option<&str>,
    ) -> Self {
        self.org = Some(OrgMembership {
            id: id.into(),
            role: role.map(str::to_string),
            slug: slug.map(str::to_string),
        });
        self
    }

    pub fn with_public_metadata(mut self, metadata: Metadata) -> Self {
        self.public_metadata = metadata;
        self
    }

    pub fn with_private_metadata(mut self, metadata: Metadata) -> Self {
        self.private_metadata = metadata;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn org(&self) -> Option<&OrgMembership> {
        self.org.as_ref()
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org.as_ref().map(|o| o.id.as_str())
    }

    pub fn org_role(&self) -> Option<&str> {
        self.org.as_ref().and_then(|o| o.role.as_deref())
    }

    pub fn org_slug(&self) -> Option<&str> {
        self.org.as_ref().and_then(|o| o.slug.as_deref())
    }

    pub fn public_metadata(&self) -> &Metadata {
        &self.public_metadata
    }

    pub fn private_metadata(&self) -> &Metadata {
        &self.private_metadata
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// String entries of a public-metadata list. Missing key, non-list value
    /// and empty list all yield nothing.
    pub fn public_list(&self, key: &str) -> impl Iterator<Item = &str> {
        self.public_metadata
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.public_list("roles")
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.public_list("scopes")
    }
}

fn string_claim(claims: &Claims, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(str::to_string)
}

fn object_claim(claims: &Claims, name: &str) -> Metadata {
    claims
        .get(name)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
