use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::http_error::AppError;

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

/// Caller identity attached to requests that passed the auth gate.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminIdentity {
    pub subject: String,
}

/// Checks a credential presented on a protected route.
pub trait TokenVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> Result<AdminIdentity, AppError>;
}

pub type DynTokenVerifier = Arc<dyn TokenVerifier>;

/// HS256 tokens signed with a shared secret.
pub struct JwtAuthority {
    secret: String,
    ttl: chrono::Duration,
}

impl JwtAuthority {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into(), ttl: chrono::Duration::hours(24) }
    }

    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        let exp = (chrono::Utc::now() + self.ttl).timestamp() as usize;
        let claims = Claims { sub: subject.to_string(), exp };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| AppError::Collaborator(e.to_string()))
    }
}

impl TokenVerifier for JwtAuthority {
    fn verify(&self, token: &str) -> Result<AdminIdentity, AppError> {
        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &Validation::default())
            .map_err(|_| AppError::unauthorized("invalid token"))?;
        Ok(AdminIdentity { subject: data.claims.sub })
    }
}
