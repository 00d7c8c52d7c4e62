pub mod access_jwt;
pub mod factory;
pub mod jwks;
pub mod verifier;

pub use access_jwt::JwtVerifier;
pub use factory::build_auth_gate;
pub use jwks::{JwksClient, JwksError};
pub use verifier::{
    FailureReason, OracleError, TokenVerifier, VerificationConfig, verify_credential,
};
