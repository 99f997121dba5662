use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;

use crate::http_error::AppError;
use crate::plugins::blog::models::BlogFields;

/// Body cap for `POST /add`.
pub const MAX_BLOG_FORM_BYTES: usize = 25 * 1024 * 1024;

fn form_error(e: MultipartError) -> AppError {
    AppError::InvalidForm(e.body_text())
}

/// The image part of the create form.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Parsed `multipart/form-data` body of `POST /add`.
#[derive(Debug, Default)]
pub struct BlogForm {
    pub blog: Option<BlogFields>,
    pub image: Option<ImageUpload>,
}

/// Reads the `blog` (JSON text) and `image` (file) parts. Unknown parts are
/// skipped; an empty file counts as no file.
pub async fn read_blog_form(mut multipart: Multipart) -> Result<BlogForm, AppError> {
    let mut form = BlogForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        match field.name() {
            Some("blog") => {
                let text = field.text().await.map_err(form_error)?;
                let fields: BlogFields = serde_json::from_str(&text).map_err(|_| AppError::MissingFields)?;
                form.blog = Some(fields);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let data = field.bytes().await.map_err(form_error)?;
                if !data.is_empty() {
                    form.image = Some(ImageUpload { file_name, bytes: data.to_vec() });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}
