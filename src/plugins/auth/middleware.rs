use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::http_error::AppError;
use crate::plugins::auth::verifier::DynTokenVerifier;

/// Pulls the credential out of `Authorization`. Both `Bearer <token>` and a
/// bare token are accepted.
pub fn credential(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() { None } else { Some(token) }
}

pub async fn require_auth(State(verifier): State<DynTokenVerifier>, mut req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let auth_hdr = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing authorization"))?;
    let token = credential(auth_hdr).ok_or_else(|| AppError::unauthorized("invalid authorization header"))?;
    let identity = verifier.verify(token)?;
    // handlers read the caller from extensions
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
