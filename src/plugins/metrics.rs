use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{routing::get, Router};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct MetricsPlugin {
    registry: Arc<Registry>,
    pub request_counter: Arc<IntCounterVec>,
    pub request_duration: Arc<HistogramVec>,
}

impl MetricsPlugin {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let counter = IntCounterVec::new(Opts::new("requests_total", "Total HTTP requests"), &["method", "path", "status"])?;
        registry.register(Box::new(counter.clone()))?;

        let hist_opts = HistogramOpts::new("request_duration_seconds", "HTTP request latencies in seconds");
        let histogram = HistogramVec::new(hist_opts, &["method", "path"])?;
        registry.register(Box::new(histogram.clone()))?;

        #[cfg(target_os = "linux")]
        {
            let collector = prometheus::process_collector::ProcessCollector::for_self();
            registry.register(Box::new(collector)).ok();
        }

        Ok(MetricsPlugin {
            registry: Arc::new(registry),
            request_counter: Arc::new(counter),
            request_duration: Arc::new(histogram),
        })
    }

    /// Wraps every route of `router` so requests are counted under their route template.
    pub fn instrument(&self, router: Router) -> Router {
        router.route_layer(middleware::from_fn_with_state(self.clone(), track))
    }

    pub fn router(&self) -> Router {
        let reg = self.registry.clone();
        Router::new().route(
            "/",
            get(move || {
                let reg = reg.clone();
                async move {
                    let mut buffer = Vec::new();
                    if let Err(e) = TextEncoder::new().encode(&reg.gather(), &mut buffer) {
                        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
                    }
                    (StatusCode::OK, String::from_utf8_lossy(&buffer).into_owned())
                }
            }),
        )
    }
}

async fn track(State(metrics): State<MetricsPlugin>, req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(req).await;

    metrics
        .request_duration
        .with_label_values(&[&method, &path])
        .observe(started.elapsed().as_secs_f64());
    metrics
        .request_counter
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();
    response
}
