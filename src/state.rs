use crate::generation::DynContentGenerator;
use crate::media::DynMediaStore;
use crate::plugins::auth::DynTokenVerifier;
use crate::store::DynBlogStore;

/// Collaborators shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: DynBlogStore,
    pub media: DynMediaStore,
    pub generator: DynContentGenerator,
    pub verifier: DynTokenVerifier,
}
