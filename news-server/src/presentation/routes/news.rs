use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::presentation::AppState;
use crate::presentation::handlers::news::{
    create_post, delete_post, list_posts, reorder_posts, update_post,
};
use crate::presentation::middleware::auth::bearer_auth_middleware;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(list_posts));

    let protected = Router::new()
        .route("/", post(create_post).put(update_post).delete(delete_post))
        .route("/reorder", post(reorder_posts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_middleware,
        ));

    public.merge(protected)
}
