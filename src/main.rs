use axum::Router;
use dotenvy::dotenv;
use quickblog_api::config::{AppConfig, StoreBackend};
use quickblog_api::generation::GeminiGenerator;
use quickblog_api::kernel::{build_app, Plugin};
use quickblog_api::media::ImageKitMedia;
use quickblog_api::plugins::admin::AdminPlugin;
use quickblog_api::plugins::auth::JwtAuthority;
use quickblog_api::plugins::blog::BlogPlugin;
use quickblog_api::plugins::health::HealthPlugin;
use quickblog_api::plugins::metrics::MetricsPlugin;
use quickblog_api::store::{DynBlogStore, InMemoryBlogStore, PgBlogStore};
use quickblog_api::{db, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    let store: DynBlogStore = match config.store {
        StoreBackend::Postgres => PgBlogStore::new(db::init_db(&config.database_url).await?).into_arc(),
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            InMemoryBlogStore::new().into_arc()
        }
    };

    let authority = Arc::new(JwtAuthority::new(config.jwt_secret.clone()));
    let state = AppState {
        store,
        media: ImageKitMedia::new(
            config.imagekit.private_key.clone(),
            config.imagekit.url_endpoint.clone(),
            config.imagekit.upload_url.clone(),
        )
        .into_arc(),
        generator: GeminiGenerator::new(
            config.gemini.api_key.clone(),
            config.gemini.model.clone(),
            config.gemini.base_url.clone(),
        )
        .into_arc(),
        verifier: authority.clone(),
    };

    let plugins_vec: Vec<Box<dyn Plugin>> = vec![
        Box::new(HealthPlugin),
        Box::new(AdminPlugin::new(state.clone(), config.admin.clone(), authority)),
        Box::new(BlogPlugin::new(state)),
    ];

    let plugin_names: Vec<&'static str> = plugins_vec.iter().map(|p| p.name()).collect();
    tracing::info!("mounting plugins: {:?}", plugin_names);

    let metrics_plugin = MetricsPlugin::new()?;
    let app: Router = build_app(&plugins_vec, Some(metrics_plugin)).await;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            for p in plugins_vec.iter() {
                p.on_shutdown().await;
            }
        })
        .await?;

    Ok(())
}
