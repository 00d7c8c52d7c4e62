use axum::extract::FromRequestParts;
use axum::http::{Extensions, request::Parts};

use crate::error::AuthError;

use super::AuthCtx;

/// Handler で、 AuthCtx を受け取るための extractor
/// middleware が AuthCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 (UNAUTHORIZED) を返す（public route・ミドルウェア未設定）
pub struct CurrentUser(pub AuthCtx);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(&parts.extensions).cloned().map(CurrentUser)
    }
}

/// Attached identity, or `UNAUTHORIZED` when the gate did not attach one.
pub fn current_user(extensions: &Extensions) -> Result<&AuthCtx, AuthError> {
    extensions.get::<AuthCtx>().ok_or_else(AuthError::unauthorized)
}
