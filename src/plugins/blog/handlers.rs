use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::generation::blog_prompt;
use crate::http_error::{ok_message, ok_payload, ApiResult, AppError};
use crate::media::{blog_image_transformations, BLOG_IMAGE_FOLDER};
use crate::plugins::auth::AdminIdentity;
use crate::plugins::blog::models::{CommentRequest, GenerateRequest, IdRequest, NewBlog, NewComment};
use crate::plugins::blog::upload::read_blog_form;
use crate::state::AppState;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Body id: absent or empty is `MissingId`, anything that is not a UUID is `InvalidId`.
fn body_id(value: Option<String>) -> Result<Uuid, AppError> {
    let raw = non_empty(value).ok_or(AppError::MissingId)?;
    Uuid::parse_str(&raw).map_err(|_| AppError::InvalidId(raw))
}

pub async fn add_blog(
    Extension(state): Extension<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let form = read_blog_form(multipart.map_err(|_| AppError::MissingFields)?).await?;
    let fields = form.blog.unwrap_or_default();

    // every precondition is checked before the upload so a rejected request has no side effect
    let (title, description, category, image) = match (
        non_empty(fields.title),
        non_empty(fields.description),
        non_empty(fields.category),
        form.image,
    ) {
        (Some(t), Some(d), Some(c), Some(i)) => (t, d, c, i),
        _ => return Err(AppError::MissingFields),
    };

    let uploaded = state.media.upload(image.bytes, &image.file_name, BLOG_IMAGE_FOLDER).await?;
    let image_url = state.media.transformed_url(&uploaded.file_path, &blog_image_transformations());

    let blog = state
        .store
        .insert_blog(NewBlog {
            title,
            sub_title: fields.sub_title,
            description,
            category,
            image: image_url,
            is_published: fields.is_published.unwrap_or(false),
        })
        .await?;

    tracing::info!(blog_id = %blog.id, "blog created");
    ok_payload("blog", blog, Some("Blog added Successfully"))
}

pub async fn list_published_blogs(Extension(state): Extension<AppState>) -> ApiResult {
    let blogs = state.store.list_blogs(true).await?;
    ok_payload("blogs", blogs, None)
}

/// Returns drafts too: anyone holding an id can preview an unpublished blog.
pub async fn get_blog(Extension(state): Extension<AppState>, Path(blog_id): Path<String>) -> ApiResult {
    if blog_id.is_empty() {
        return Err(AppError::MissingId);
    }
    let id = Uuid::parse_str(&blog_id).map_err(|_| AppError::NotFound("Blog"))?;
    let blog = state.store.get_blog(id).await?.ok_or(AppError::NotFound("Blog"))?;
    ok_payload("blog", blog, None)
}

/// Deletes the blog and then its comments. The two steps are not atomic; both
/// are idempotent so a failed call can simply be repeated.
pub async fn delete_blog(
    Extension(state): Extension<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload.map_err(|_| AppError::MissingId)?;
    let id = body_id(req.id)?;

    let removed = state.store.delete_blog(id).await?;
    let comments = state.store.delete_comments_for_blog(id).await?;
    tracing::info!(blog_id = %id, removed, comments, "blog deleted");

    ok_message("Blog Deleted Successfully")
}

pub async fn toggle_publish(
    Extension(state): Extension<AppState>,
    payload: Result<Json<IdRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload.map_err(|_| AppError::MissingId)?;
    let id = body_id(req.id)?;

    let blog = state.store.toggle_published(id).await?.ok_or(AppError::NotFound("Blog"))?;
    tracing::info!(blog_id = %id, is_published = blog.is_published, "blog publish state toggled");
    ok_payload("blog", blog, Some("Blog status Updated"))
}

/// The referenced blog is not looked up; comments on unknown ids are accepted.
pub async fn add_comment(
    Extension(state): Extension<AppState>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload.map_err(|_| AppError::MissingFields)?;
    let (blog_id, name, content) = match (non_empty(req.blog_id), non_empty(req.name), non_empty(req.content)) {
        (Some(b), Some(n), Some(c)) => (b, n, c),
        _ => return Err(AppError::MissingFields),
    };
    let blog_id = Uuid::parse_str(&blog_id).map_err(|_| AppError::InvalidId(blog_id))?;

    let comment = state.store.insert_comment(NewComment { blog_id, name, content }).await?;
    ok_payload("comment", comment, Some("Comment Added for Review"))
}

pub async fn list_comments(Extension(state): Extension<AppState>) -> ApiResult {
    let comments = state.store.list_comments().await?;
    ok_payload("comments", comments, None)
}

pub async fn generate_content(
    Extension(state): Extension<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload.map_err(|_| AppError::MissingFields)?;
    let prompt = non_empty(req.prompt).ok_or(AppError::MissingFields)?;

    tracing::info!(admin = %admin.subject, "generating blog content");
    let content = state.generator.generate(&blog_prompt(&prompt)).await?;
    ok_payload("content", content, None)
}
