#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::TcpListener;

use quickblog_api::generation::{ContentGenerator, GenerationError};
use quickblog_api::kernel::{build_app, Plugin};
use quickblog_api::media::{build_transformed_url, MediaError, MediaStore, Transformation, UploadedFile};
use quickblog_api::plugins::admin::{AdminAccount, AdminPlugin};
use quickblog_api::plugins::auth::JwtAuthority;
use quickblog_api::plugins::blog::BlogPlugin;
use quickblog_api::plugins::health::HealthPlugin;
use quickblog_api::plugins::metrics::MetricsPlugin;
use quickblog_api::store::{DynBlogStore, InMemoryBlogStore};
use quickblog_api::AppState;

pub const JWT_SECRET_CONST: &str = "quickblog-test-secret";
pub const ADMIN_EMAIL: &str = "admin@quickblog.test";
pub const ADMIN_PASSWORD: &str = "correct horse battery";
pub const URL_ENDPOINT: &str = "https://ik.imagekit.test/quickblog";

#[derive(Default)]
pub struct FakeMedia {
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, folder: &str) -> Result<UploadedFile, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::EmptyFile);
        }
        let file_path = format!("{}/{}", folder, file_name);
        self.uploads.lock().push(file_path.clone());
        Ok(UploadedFile { file_path })
    }

    fn transformed_url(&self, file_path: &str, transformations: &[Transformation]) -> String {
        build_transformed_url(URL_ENDPOINT, file_path, transformations)
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());
        Ok("Cats are small, carnivorous mammals.".to_string())
    }
}

/// Generator that always fails, for checking collaborator errors stay in-band.
pub struct BrokenGenerator;

#[async_trait]
impl ContentGenerator for BrokenGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Rejected { status: 503, body: "model overloaded".to_string() })
    }
}

pub struct TestApp {
    pub base: String,
    pub server_handle: tokio::task::JoinHandle<()>,
    pub store: DynBlogStore,
    pub media: Arc<FakeMedia>,
    pub generator: Arc<FakeGenerator>,
    pub authority: Arc<JwtAuthority>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn shutdown(self) {
        self.server_handle.abort();
        let _ = self.server_handle.await;
    }
}

pub fn admin_account() -> AdminAccount {
    AdminAccount {
        email: ADMIN_EMAIL.to_string(),
        // lowest cost keeps the tests fast
        password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).expect("hash"),
    }
}

pub async fn spawn_app() -> anyhow::Result<TestApp> {
    spawn_app_with_generator(None).await
}

pub async fn spawn_app_with_generator(generator_override: Option<Arc<dyn ContentGenerator>>) -> anyhow::Result<TestApp> {
    let store: DynBlogStore = InMemoryBlogStore::new().into_arc();
    let media = Arc::new(FakeMedia::default());
    let generator = Arc::new(FakeGenerator::default());
    let authority = Arc::new(JwtAuthority::new(JWT_SECRET_CONST));

    let state = AppState {
        store: store.clone(),
        media: media.clone(),
        generator: generator_override.unwrap_or_else(|| generator.clone() as Arc<dyn ContentGenerator>),
        verifier: authority.clone(),
    };

    let plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(HealthPlugin),
        Box::new(AdminPlugin::new(state.clone(), admin_account(), authority.clone())),
        Box::new(BlogPlugin::new(state)),
    ];
    let app = build_app(&plugins, Some(MetricsPlugin::new()?)).await;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    Ok(TestApp { base: format!("http://{}", addr), server_handle, store, media, generator, authority })
}

pub async fn login(client: &reqwest::Client, app: &TestApp) -> anyhow::Result<String> {
    let body: serde_json::Value = client
        .post(app.url("/api/admin/login"))
        .json(&serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await?
        .json()
        .await?;
    let token = body["token"].as_str().ok_or_else(|| anyhow::anyhow!("login failed: {}", body))?;
    Ok(token.to_string())
}
