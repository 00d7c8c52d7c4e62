/*
 * Responsibility
 * - GET /me の response DTO
 * - private_metadata / 生の claims は返さない
 */
use serde::Serialize;

use crate::api::v1::extractors::{AuthCtx, Metadata};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub session_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub org_id: Option<String>,
    pub org_role: Option<String>,
    pub org_slug: Option<String>,
    pub public_metadata: Metadata,
}

impl From<&AuthCtx> for MeResponse {
    fn from(ctx: &AuthCtx) -> Self {
        Self {
            user_id: ctx.user_id().to_string(),
            session_id: ctx.session_id().to_string(),
            email: ctx.email().map(str::to_string),
            first_name: ctx.first_name().map(str::to_string),
            last_name: ctx.last_name().map(str::to_string),
            image_url: ctx.image_url().map(str::to_string),
            org_id: ctx.org_id().map(str::to_string),
            org_role: ctx.org_role().map(str::to_string),
            org_slug: ctx.org_slug().map(str::to_string),
            public_metadata: ctx.public_metadata().clone(),
        }
    }
}
