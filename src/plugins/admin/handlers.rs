use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use bcrypt::verify;
use std::sync::Arc;

use crate::http_error::{ok_payload, ApiResult, AppError};
use crate::plugins::admin::models::{AdminAccount, LoginRequest, LoginResponse};
use crate::plugins::auth::{AdminIdentity, JwtAuthority};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid Credentials";

pub async fn login(
    Extension(account): Extension<Arc<AdminAccount>>,
    Extension(authority): Extension<Arc<JwtAuthority>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload.map_err(|_| AppError::MissingFields)?;
    let (email, password) = match (req.email, req.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(AppError::MissingFields),
    };

    if email != account.email {
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }
    let valid = verify(&password, &account.password_hash).map_err(|e| AppError::Collaborator(e.to_string()))?;
    if !valid {
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = authority.issue(&email)?;
    tracing::info!(admin = %email, "admin logged in");
    Ok(Json(LoginResponse { success: true, token }))
}

/// Drafts included.
pub async fn list_all_blogs(Extension(state): Extension<AppState>) -> ApiResult {
    let blogs = state.store.list_blogs(false).await?;
    ok_payload("blogs", blogs, None)
}

pub async fn dashboard(Extension(state): Extension<AppState>, Extension(admin): Extension<AdminIdentity>) -> ApiResult {
    tracing::debug!(admin = %admin.subject, "dashboard requested");
    let stats = state.store.dashboard().await?;
    ok_payload("dashboardData", stats, None)
}
