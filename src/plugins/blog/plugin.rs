use axum::extract::DefaultBodyLimit;
use axum::{middleware, routing::get, routing::post, Extension, Router};

use crate::kernel::Plugin;
use crate::plugins::auth::require_auth;
use crate::plugins::blog::handlers::*;
use crate::plugins::blog::upload::MAX_BLOG_FORM_BYTES;
use crate::state::AppState;

pub struct BlogPlugin {
    state: AppState,
}

impl BlogPlugin {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Plugin for BlogPlugin {
    async fn router(&self) -> Router {
        let protected = Router::new()
            .route("/add", post(add_blog).layer(DefaultBodyLimit::max(MAX_BLOG_FORM_BYTES)))
            .route("/generate", post(generate_content))
            .route("/delete", post(delete_blog))
            .route("/toggle-publish", post(toggle_publish))
            .route_layer(middleware::from_fn_with_state(self.state.verifier.clone(), require_auth));

        let public = Router::new()
            .route("/all", get(list_published_blogs))
            .route("/add-comments", post(add_comment))
            .route("/comments", post(list_comments))
            .route("/:blogId", get(get_blog));

        protected.merge(public).layer(Extension(self.state.clone()))
    }

    fn name(&self) -> &'static str {
        "api/blog"
    }
}
