//! Image storage collaborator.
//!
//! Uploads raw bytes to an ImageKit-compatible service and builds delivery
//! URLs that carry on-the-fly transformation parameters.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Folder every blog cover image is uploaded into.
pub const BLOG_IMAGE_FOLDER: &str = "/blogs";

/// Width blog cover images are resized to on delivery.
pub const BLOG_IMAGE_WIDTH: u32 = 1280;

/// Errors from the media layer.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("image file is empty")]
    EmptyFile,

    #[error("image upload failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image service error ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// One step of a delivery-time transformation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformation {
    Quality(String),
    Format(String),
    Width(u32),
}

impl Transformation {
    fn param(&self) -> String {
        match self {
            Transformation::Quality(q) => format!("q-{}", q),
            Transformation::Format(f) => format!("f-{}", f),
            Transformation::Width(w) => format!("w-{}", w),
        }
    }
}

/// The chain applied to blog cover images: auto quality, webp, fixed width.
pub fn blog_image_transformations() -> Vec<Transformation> {
    vec![
        Transformation::Quality("auto".to_string()),
        Transformation::Format("webp".to_string()),
        Transformation::Width(BLOG_IMAGE_WIDTH),
    ]
}

/// The part of the upload reply the service keeps; delivery URLs are rebuilt from the path.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_path: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, folder: &str) -> Result<UploadedFile, MediaError>;

    /// Pure URL construction; never touches the network.
    fn transformed_url(&self, file_path: &str, transformations: &[Transformation]) -> String;
}

pub type DynMediaStore = Arc<dyn MediaStore>;

/// `{endpoint}/tr:q-auto:f-webp:w-1280/blogs/file.png`
pub fn build_transformed_url(url_endpoint: &str, file_path: &str, transformations: &[Transformation]) -> String {
    let endpoint = url_endpoint.trim_end_matches('/');
    let path = if file_path.starts_with('/') { file_path.to_string() } else { format!("/{}", file_path) };
    if transformations.is_empty() {
        return format!("{}{}", endpoint, path);
    }
    let chain: Vec<String> = transformations.iter().map(Transformation::param).collect();
    format!("{}/tr:{}{}", endpoint, chain.join(":"), path)
}

pub struct ImageKitMedia {
    client: reqwest::Client,
    private_key: String,
    url_endpoint: String,
    upload_url: String,
}

impl ImageKitMedia {
    pub fn new(private_key: String, url_endpoint: String, upload_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            private_key,
            url_endpoint,
            upload_url,
        }
    }

    pub fn into_arc(self) -> DynMediaStore {
        Arc::new(self)
    }
}

#[async_trait]
impl MediaStore for ImageKitMedia {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, folder: &str) -> Result<UploadedFile, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::EmptyFile);
        }

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("fileName", file_name.to_string())
            .text("folder", folder.to_string());

        let response = self
            .client
            .post(&self.upload_url)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected { status: status.as_u16(), body });
        }

        let uploaded: UploadedFile = response.json().await?;
        tracing::info!(file_path = %uploaded.file_path, "image uploaded");
        Ok(uploaded)
    }

    fn transformed_url(&self, file_path: &str, transformations: &[Transformation]) -> String {
        build_transformed_url(&self.url_endpoint, file_path, transformations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, State};
    use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::{routing::post, Json, Router};
    use parking_lot::Mutex;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct SeenUpload {
        authorization: Option<String>,
        // (field name, file name, contents)
        fields: Vec<(String, Option<String>, String)>,
    }

    type Seen = Arc<Mutex<SeenUpload>>;

    async fn imagekit_stub(State((seen, fail)): State<(Seen, bool)>, headers: HeaderMap, mut multipart: Multipart) -> Response {
        let mut record = SeenUpload {
            authorization: headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string),
            ..Default::default()
        };
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await.unwrap_or_default();
            record.fields.push((name, file_name, String::from_utf8_lossy(&data).into_owned()));
        }
        *seen.lock() = record;

        if fail {
            return (StatusCode::SERVICE_UNAVAILABLE, "quota exceeded").into_response();
        }
        Json(serde_json::json!({
            "fileId": "f-1",
            "name": "cat.png",
            "filePath": "/blogs/cat.png",
            "url": "https://ik.imagekit.io/demo/blogs/cat.png"
        }))
        .into_response()
    }

    async fn spawn_stub(fail: bool) -> (String, Seen) {
        let seen = Seen::default();
        let router = Router::new().route("/api/v1/files/upload", post(imagekit_stub)).with_state((seen.clone(), fail));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}/api/v1/files/upload", addr), seen)
    }

    #[tokio::test]
    async fn upload_sends_multipart_form_with_basic_auth() {
        let (upload_url, seen) = spawn_stub(false).await;
        let media = ImageKitMedia::new("private_test_key".into(), "https://ik.imagekit.io/demo".into(), upload_url);

        let uploaded = media.upload(b"PNGDATA".to_vec(), "cat.png", BLOG_IMAGE_FOLDER).await.unwrap();
        assert_eq!(uploaded.file_path, "/blogs/cat.png");

        let seen = seen.lock();
        // base64("private_test_key:")
        assert_eq!(seen.authorization.as_deref(), Some("Basic cHJpdmF0ZV90ZXN0X2tleTo="));
        assert_eq!(
            seen.fields,
            vec![
                ("file".to_string(), Some("cat.png".to_string()), "PNGDATA".to_string()),
                ("fileName".to_string(), None, "cat.png".to_string()),
                ("folder".to_string(), None, "/blogs".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn non_success_reply_is_rejected_with_status_and_body() {
        let (upload_url, _seen) = spawn_stub(true).await;
        let media = ImageKitMedia::new("private_test_key".into(), "https://ik.imagekit.io/demo".into(), upload_url);

        let err = media.upload(b"PNGDATA".to_vec(), "cat.png", BLOG_IMAGE_FOLDER).await.unwrap_err();
        match err {
            MediaError::Rejected { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blog_chain_renders_in_order() {
        let url = build_transformed_url("https://ik.imagekit.io/demo/", "/blogs/cat.png", &blog_image_transformations());
        assert_eq!(url, "https://ik.imagekit.io/demo/tr:q-auto:f-webp:w-1280/blogs/cat.png");
    }

    #[test]
    fn relative_path_gets_leading_slash() {
        let url = build_transformed_url("https://ik.imagekit.io/demo", "blogs/cat.png", &[]);
        assert_eq!(url, "https://ik.imagekit.io/demo/blogs/cat.png");
    }

    #[tokio::test]
    async fn empty_upload_is_refused_locally() {
        let media = ImageKitMedia::new("key".into(), "https://ik.imagekit.io/demo".into(), "http://127.0.0.1:9/upload".into());
        let err = media.upload(Vec::new(), "a.png", BLOG_IMAGE_FOLDER).await.unwrap_err();
        assert!(matches!(err, MediaError::EmptyFile));
    }
}
