pub mod auth_ctx;

pub use auth_ctx::{
    AuthCtx, Claims, ClaimsError, CurrentUser, Metadata, OrgMembership, current_user,
};
