pub mod middleware;
pub mod verifier;

pub use middleware::require_auth;
pub use verifier::{AdminIdentity, DynTokenVerifier, JwtAuthority, TokenVerifier};
