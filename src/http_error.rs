use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::Error as SqlxError;

use crate::generation::GenerationError;
use crate::media::MediaError;

/// Every failure leaves the service as `200 {success:false, message}`;
/// callers tell errors apart by the message only.
#[derive(Serialize)]
struct FailureBody {
    success: bool,
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing required Fields")]
    MissingFields,

    #[error("Blog ID is missing")]
    MissingId,

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    /// The request body could not be read as a form.
    #[error("{0}")]
    InvalidForm(String),

    #[error("Route not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Database, media or generation service failure, message passed through.
    #[error("{0}")]
    Collaborator(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    fn is_caller_error(&self) -> bool {
        !matches!(self, AppError::Collaborator(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_caller_error() {
            tracing::warn!(error = %self, "request rejected");
        } else {
            tracing::error!(error = %self, "collaborator failure");
        }
        let body = FailureBody { success: false, message: self.to_string() };
        (StatusCode::OK, Json(body)).into_response()
    }
}

impl From<SqlxError> for AppError {
    fn from(e: SqlxError) -> Self {
        match e {
            SqlxError::RowNotFound => AppError::NotFound("Record"),
            SqlxError::Database(db) => AppError::Collaborator(db.message().to_string()),
            other => AppError::Collaborator(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<SqlxError>() {
            Ok(sqlx_err) => AppError::from(sqlx_err),
            Err(other) => AppError::Collaborator(other.to_string()),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        AppError::Collaborator(e.to_string())
    }
}

impl From<GenerationError> for AppError {
    fn from(e: GenerationError) -> Self {
        AppError::Collaborator(e.to_string())
    }
}

pub type ApiResult = Result<Json<Value>, AppError>;

/// `{success:true, message}`
pub fn ok_message(message: &str) -> ApiResult {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    body.insert("message".into(), Value::String(message.to_string()));
    Ok(Json(Value::Object(body)))
}

/// `{success:true, <key>: payload}`, optionally with a message.
pub fn ok_payload<T: Serialize>(key: &str, payload: T, message: Option<&str>) -> ApiResult {
    let value = serde_json::to_value(payload).map_err(|e| AppError::Collaborator(e.to_string()))?;
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    if let Some(message) = message {
        body.insert("message".into(), Value::String(message.to_string()));
    }
    body.insert(key.to_string(), value);
    Ok(Json(Value::Object(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failures_render_as_ok_status_with_envelope() {
        let resp = AppError::NotFound("Blog").into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], "Blog not found");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = AppError::from(anyhow::Error::from(SqlxError::RowNotFound));
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn payload_envelope_carries_key_and_message() {
        let Json(v) = ok_payload("content", "hello", Some("done")).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["content"], "hello");
        assert_eq!(v["message"], "done");
    }
}
