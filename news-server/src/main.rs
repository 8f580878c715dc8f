use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::news_service::NewsService;
use application::upload_service::UploadService;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::TokenVerifier;
use infrastructure::logging::init_logging;
use infrastructure::object_store::LocalObjectStore;
use infrastructure::settings::Settings;
use presentation::{AppState, SharedObjectStore, SharedPostRepository};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database_url, settings.database_max_connections).await?;
    run_migrations(&pool).await?;

    let repository: SharedPostRepository = Arc::new(PostgresPostRepository::new(pool));
    let object_store = LocalObjectStore::new(settings.upload_dir.clone(), &settings.public_base_url)
        .with_context(|| format!("failed to prepare {}", settings.upload_dir.display()))?;
    let upload_root = object_store.root().to_path_buf();
    let object_store: SharedObjectStore = Arc::new(object_store);

    let tokens = settings
        .auth_jwt_secret
        .as_deref()
        .map(|secret| Arc::new(TokenVerifier::new(secret)));
    if tokens.is_none() {
        info!("AUTH_JWT_SECRET not set, bearer tokens are checked for presence only");
    }

    let state = AppState::new(
        Arc::new(NewsService::new(repository)),
        Arc::new(UploadService::new(object_store)),
        tokens,
        settings.upload_body_limit_bytes,
    );

    server::run_http(&settings, state, &upload_root).await
}
