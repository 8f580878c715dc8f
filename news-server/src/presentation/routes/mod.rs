use axum::Router;

use super::AppState;

pub(crate) mod news;
pub(crate) mod upload;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/news", news::router(state.clone()))
        .nest("/api/upload", upload::router(state))
}
