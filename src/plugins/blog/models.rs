use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub sub_title: Option<String>,
    pub description: String,
    pub category: String,
    pub image: String,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Fields accepted from the JSON-encoded `blog` part of the create form.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlogFields {
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub sub_title: Option<String>,
    pub description: String,
    pub category: String,
    pub image: String,
    pub is_published: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "blog")]
    pub blog_id: Uuid,
    pub name: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A comment with its parent blog resolved; `blog` is `None` for orphans.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithBlog {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub blog: Option<Blog>,
    pub name: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub blog_id: Uuid,
    pub name: String,
    pub content: String,
}

#[derive(Deserialize, Debug)]
pub struct IdRequest {
    pub id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub blog_id: Option<String>,
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub blogs: i64,
    pub comments: i64,
    pub drafts: i64,
    pub recent_blogs: Vec<Blog>,
}
