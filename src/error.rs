/*
 * Responsibility
 * - 認証/認可エラーの分類 (ErrorKind) と AuthError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - handler / extractor / guard のどこで返しても同じ形のレスポンスになる
 */
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Closed set of authentication/authorization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    InvalidToken,
    TokenExpired,
    Forbidden,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Forbidden => "FORBIDDEN",
        }
    }

    /// `FORBIDDEN` is the only authorization failure; everything else is 401.
    pub fn default_status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthorized | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct AuthError {
    kind: ErrorKind,
    message: String,
    status: StatusCode,
}

impl AuthError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: kind.default_status(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "Authentication required")
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorKind::InvalidToken, "Invalid token")
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorKind::TokenExpired, "Token expired")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Override the status derived from the kind. Integrations only; the
    /// built-in components never call this.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.kind.as_str(),
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn kinds_map_to_fixed_status_classes() {
        assert_eq!(
            AuthError::unauthorized().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::invalid_token().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::token_expired().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::forbidden("nope").status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn explicit_status_override_is_kept() {
        let err = AuthError::unauthorized().with_status(StatusCode::FORBIDDEN);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = AuthError::forbidden("Role 'admin' required");
        assert_eq!(err.to_string(), "FORBIDDEN: Role 'admin' required");
    }

    #[tokio::test]
    async fn response_body_has_error_envelope() {
        let response = AuthError::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": { "code": "UNAUTHORIZED", "message": "Authentication required" }
            })
        );
    }

    #[tokio::test]
    async fn forbidden_response_uses_403() {
        let response = AuthError::forbidden("Organization membership required").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(json["error"]["message"], "Organization membership required");
    }
}
