//! Request authentication for axum services.
//!
//! - [`middleware::auth::access`]: the gate (credential → verifier → `AuthCtx`)
//! - [`middleware::auth::guard`]: permission guards over `AuthCtx`
//! - [`services::auth`]: the verifier capability and the RS256/JWKS implementation
//! - [`error`]: `AuthError` and its JSON response mapping

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use api::v1::extractors::{AuthCtx, CurrentUser, current_user};
pub use error::{AuthError, ErrorKind};
pub use middleware::auth::{AuthGate, Guard, RouteConfig, RouteTable};
pub use services::auth::{TokenVerifier, VerificationConfig};
