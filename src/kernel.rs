use async_trait::async_trait;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::http_error::AppError;
use crate::plugins::metrics::MetricsPlugin;

#[async_trait]
pub trait Plugin: Send + Sync {
    async fn router(&self) -> Router;

    fn name(&self) -> &'static str;
    /// Optional lifecycle hook called when the kernel starts.
    async fn on_start(&self) {}
    /// Optional lifecycle hook called on shutdown.
    async fn on_shutdown(&self) {}
}

/// A panicking handler still answers with the failure envelope.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "internal error".to_string()
    };
    tracing::error!(%message, "handler panicked");
    (StatusCode::OK, Json(serde_json::json!({ "success": false, "message": message }))).into_response()
}

/// Unknown paths and wrong methods answer with the failure envelope too.
async fn envelope_routing_errors(resp: Response) -> Response {
    match resp.status() {
        StatusCode::NOT_FOUND => AppError::RouteNotFound.into_response(),
        StatusCode::METHOD_NOT_ALLOWED => AppError::MethodNotAllowed.into_response(),
        _ => resp,
    }
}

/// Builds the application router by mounting each plugin under `/{plugin.name()}`.
/// When `metrics` is given every plugin router is instrumented and the
/// exposition endpoint is mounted at `/metrics`.
pub async fn build_app(plugins: &[Box<dyn Plugin>], metrics: Option<MetricsPlugin>) -> Router {
    let mut app = Router::new();

    for plugin in plugins.iter() {
        info!("starting plugin {}", plugin.name());
        plugin.on_start().await;
        let mut router = plugin.router().await;
        if let Some(m) = metrics.as_ref() {
            router = m.instrument(router);
        }
        app = app.nest(&format!("/{}", plugin.name()), router);
    }

    if let Some(m) = metrics.as_ref() {
        app = app.nest("/metrics", m.router());
    }

    app.layer(middleware::map_response(envelope_routing_errors))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
