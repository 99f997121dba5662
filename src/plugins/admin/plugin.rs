use axum::{middleware, routing::get, routing::post, Extension, Router};
use std::sync::Arc;

use crate::kernel::Plugin;
use crate::plugins::admin::handlers;
use crate::plugins::admin::models::AdminAccount;
use crate::plugins::auth::{require_auth, JwtAuthority};
use crate::state::AppState;

pub struct AdminPlugin {
    state: AppState,
    account: Arc<AdminAccount>,
    authority: Arc<JwtAuthority>,
}

impl AdminPlugin {
    pub fn new(state: AppState, account: AdminAccount, authority: Arc<JwtAuthority>) -> Self {
        Self { state, account: Arc::new(account), authority }
    }
}

#[async_trait::async_trait]
impl Plugin for AdminPlugin {
    async fn router(&self) -> Router {
        let public = Router::new()
            .route("/login", post(handlers::login))
            .layer(Extension(self.account.clone()))
            .layer(Extension(self.authority.clone()));

        let protected = Router::new()
            .route("/blogs", get(handlers::list_all_blogs))
            .route("/dashboard", get(handlers::dashboard))
            .route_layer(middleware::from_fn_with_state(self.state.verifier.clone(), require_auth));

        public.merge(protected).layer(Extension(self.state.clone()))
    }

    fn name(&self) -> &'static str {
        "api/admin"
    }
}
