pub mod access;
pub mod credential;
pub mod guard;

pub use access::{AuthGate, AuthGateBuilder, FailureObserver, RouteConfig, RouteTable, apply};
pub use credential::{Credential, CredentialSource, extract_credential};
pub use guard::{
    Guard, enforce, require_org_membership, require_org_role, require_permission, require_role,
    require_scopes,
};
