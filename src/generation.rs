//! Text generation collaborator backed by the Gemini `generateContent` API.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Appended to every user prompt before it is sent to the generator.
pub const CONTENT_PROMPT_SUFFIX: &str = "Generate a blog content for this topic in simple text format";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation service error ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("generation service returned no text")]
    EmptyResponse,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync + 'static {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub type DynContentGenerator = Arc<dyn ContentGenerator>;

pub fn blog_prompt(topic: &str) -> String {
    format!("{}{}", topic, CONTENT_PROMPT_SUFFIX)
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    pub fn into_arc(self) -> DynContentGenerator {
        Arc::new(self)
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Rejected { status: status.as_u16(), body });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.into_text().ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::Value;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct SeenRequest {
        path: String,
        api_key: Option<String>,
        body: Value,
    }

    type Seen = Arc<Mutex<SeenRequest>>;

    async fn gemini_stub(
        State((seen, fail)): State<(Seen, bool)>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        *seen.lock() = SeenRequest {
            path: uri.path().to_string(),
            api_key: headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()).map(str::to_string),
            body,
        };
        if fail {
            return (StatusCode::SERVICE_UNAVAILABLE, "model overloaded").into_response();
        }
        Json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Cats are " }, { "text": "great." }], "role": "model" } }]
        }))
        .into_response()
    }

    async fn spawn_stub(fail: bool) -> (String, Seen) {
        let seen = Seen::default();
        let router = Router::new().fallback(gemini_stub).with_state((seen.clone(), fail));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}/v1beta/", addr), seen)
    }

    #[tokio::test]
    async fn generate_posts_prompt_to_model_endpoint() {
        let (base_url, seen) = spawn_stub(false).await;
        let generator = GeminiGenerator::new("gemini-test-key".into(), "gemini-test".into(), base_url);

        let text = generator.generate("cats").await.unwrap();
        assert_eq!(text, "Cats are great.");

        let seen = seen.lock();
        assert_eq!(seen.path, "/v1beta/models/gemini-test:generateContent");
        assert_eq!(seen.api_key.as_deref(), Some("gemini-test-key"));
        assert_eq!(seen.body["contents"][0]["parts"][0]["text"], "cats");
    }

    #[tokio::test]
    async fn non_success_reply_is_rejected_with_status_and_body() {
        let (base_url, _seen) = spawn_stub(true).await;
        let generator = GeminiGenerator::new("gemini-test-key".into(), "gemini-test".into(), base_url);

        match generator.generate("cats").await.unwrap_err() {
            GenerationError::Rejected { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prompt_suffix_is_appended_verbatim() {
        assert_eq!(blog_prompt("cats"), "catsGenerate a blog content for this topic in simple text format");
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let raw = serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Cats " }, { "text": "purr." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        let parsed: GenerateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Cats purr."));
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.into_text().is_none());
    }
}
