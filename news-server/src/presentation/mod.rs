use std::sync::Arc;

use crate::application::news_service::NewsService;
use crate::application::upload_service::UploadService;
use crate::data::post_repository::PostRepository;
use crate::infrastructure::jwt::TokenVerifier;
use crate::infrastructure::object_store::ObjectStore;

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod json;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

pub(crate) type SharedPostRepository = Arc<dyn PostRepository>;
pub(crate) type SharedObjectStore = Arc<dyn ObjectStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) news_service: Arc<NewsService<SharedPostRepository>>,
    pub(crate) upload_service: Arc<UploadService<SharedObjectStore>>,
    /// `None` keeps the bearer check presence-only.
    pub(crate) tokens: Option<Arc<TokenVerifier>>,
    pub(crate) upload_body_limit_bytes: usize,
}

impl AppState {
    pub(crate) fn new(
        news_service: Arc<NewsService<SharedPostRepository>>,
        upload_service: Arc<UploadService<SharedObjectStore>>,
        tokens: Option<Arc<TokenVerifier>>,
        upload_body_limit_bytes: usize,
    ) -> Self {
        Self {
            news_service,
            upload_service,
            tokens,
            upload_body_limit_bytes,
        }
    }
}
