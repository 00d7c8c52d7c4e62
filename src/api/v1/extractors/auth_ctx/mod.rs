/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト（AuthCtx）を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - AuthCtx / OrgMembership
 * - CurrentUser (extractor) / current_user (retrieval helper)
 */

mod core;
mod types;

pub use self::core::{CurrentUser, current_user};
pub use self::types::{AuthCtx, Claims, ClaimsError, Metadata, OrgMembership};
