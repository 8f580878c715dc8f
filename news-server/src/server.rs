use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::infrastructure::object_store::LocalObjectStore;
use crate::infrastructure::settings::Settings;
use crate::presentation::middleware::cors::apply_cors;
use crate::presentation::middleware::trace::apply_trace;
use crate::presentation::openapi::ApiDoc;
use crate::presentation::{AppState, http_handlers};

pub(crate) async fn run_http(
    settings: &Settings,
    state: AppState,
    upload_root: &Path,
) -> anyhow::Result<()> {
    let app = build_router(state, upload_root);
    let app = apply_limits(app, settings);
    let app = apply_trace(app);
    let app = apply_cors(app, settings)?;

    let listener = TcpListener::bind(&settings.http_addr).await?;

    info!("HTTP server listening on {}", settings.http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub(crate) fn build_router(state: AppState, upload_root: &Path) -> Router {
    http_handlers::routes(state)
        .nest_service(LocalObjectStore::PUBLIC_PREFIX, ServeDir::new(upload_root))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

// The upload route carries its own, larger body limit.
fn apply_limits(router: Router, settings: &Settings) -> Router {
    let router = router
        .layer(DefaultBodyLimit::max(settings.http_request_body_limit_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(settings.http_request_timeout_secs),
        ));
    limit_concurrency(router, settings.http_concurrency_limit)
}

// `Router::layer` clones the layer into every route; the global variant keeps
// one semaphore behind all of those clones.
fn limit_concurrency(router: Router, max_in_flight: usize) -> Router {
    router.layer(GlobalConcurrencyLimitLayer::new(max_in_flight))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use axum::http::{Request, StatusCode, header};
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tokio::sync::Notify;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::{build_router, limit_concurrency};
    use crate::application::news_service::NewsService;
    use crate::application::upload_service::UploadService;
    use crate::data::repositories::memory::InMemoryPostRepository;
    use crate::domain::post::Post;
    use crate::infrastructure::jwt::TokenVerifier;
    use crate::infrastructure::jwt::tests::{SECRET, mint};
    use crate::infrastructure::object_store::LocalObjectStore;
    use crate::presentation::{AppState, SharedObjectStore, SharedPostRepository};

    const BEARER: &str = "Bearer any-session-token";

    struct Harness {
        app: Router,
        repo: InMemoryPostRepository,
        upload_root: PathBuf,
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.upload_root);
        }
    }

    fn harness(tokens: Option<TokenVerifier>) -> Harness {
        let repo = InMemoryPostRepository::new();
        let upload_root = std::env::temp_dir().join(format!("news-uploads-{}", Uuid::new_v4()));
        let store = LocalObjectStore::new(upload_root.clone(), "http://news.test")
            .expect("temp upload dir");

        let shared_repo: SharedPostRepository = Arc::new(repo.clone());
        let shared_store: SharedObjectStore = Arc::new(store);
        let state = AppState::new(
            Arc::new(NewsService::new(shared_repo)),
            Arc::new(UploadService::new(shared_store)),
            tokens.map(Arc::new),
            1024 * 1024,
        );

        Harness {
            app: build_router(state, &upload_root),
            repo,
            upload_root,
        }
    }

    fn post(order: i32, published: bool, deleted: bool) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            title: format!("post {order}"),
            author: "Author".to_string(),
            content: String::new(),
            image_url: None,
            is_pinned: false,
            published,
            deleted,
            display_order: Some(order),
            created_at: now,
            updated_at: now,
        }
    }

    fn json_request(method: &str, uri: &str, body: Value, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request must build")
    }

    fn bare_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).expect("request must build")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body must be readable")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn listed_ids(body: &Value) -> Vec<String> {
        body["posts"]
            .as_array()
            .expect("posts must be an array")
            .iter()
            .map(|post| post["id"].as_str().expect("id").to_string())
            .collect()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let h = harness(None);
        let (status, body) = send(&h.app, bare_request("GET", "/healthz", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn mutating_routes_require_a_bearer_token() {
        let h = harness(None);

        let (status, body) = send(
            &h.app,
            json_request("POST", "/api/news", json!({"title": "t", "author": "a"}), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        for (method, uri) in [
            ("PUT", "/api/news"),
            ("DELETE", "/api/news?id=x"),
            ("POST", "/api/news/reorder"),
            ("POST", "/api/upload"),
        ] {
            let (status, _) = send(&h.app, bare_request(method, uri, Some("Basic abc"))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn public_listing_needs_no_token_and_hides_drafts() {
        let h = harness(None);
        let live = post(0, true, false);
        h.repo.seed(live.clone());
        h.repo.seed(post(1, false, false));
        h.repo.seed(post(2, true, true));

        let (status, body) = send(&h.app, bare_request("GET", "/api/news", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed_ids(&body), vec![live.id.to_string()]);
        assert!(body.get("error").is_none());

        let (_, body) = send(
            &h.app,
            bare_request("GET", "/api/news?includeUnpublished=true&includeDeleted=true", None),
        )
        .await;
        assert_eq!(listed_ids(&body).len(), 3);
    }

    #[tokio::test]
    async fn listing_reports_storage_failure_with_status_200() {
        let h = harness(None);
        h.repo.seed(post(0, true, false));
        h.repo.fail_reads();

        let (status, body) = send(&h.app, bare_request("GET", "/api/news", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"], json!([]));
        assert_eq!(body["error"], "connection refused");
    }

    #[tokio::test]
    async fn create_returns_the_stored_post() {
        let h = harness(None);
        h.repo.seed(post(0, true, false));

        let (status, body) = send(
            &h.app,
            json_request(
                "POST",
                "/api/news",
                json!({"title": "Spring fair", "author": "Events", "content": "Saturday"}),
                Some(BEARER),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["post"]["title"], "Spring fair");
        assert_eq!(body["post"]["published"], false);
        assert_eq!(body["post"]["is_pinned"], false);
        assert_eq!(body["post"]["display_order"], 1);
    }

    #[tokio::test]
    async fn create_without_title_is_a_validation_error() {
        let h = harness(None);
        let (status, body) = send(
            &h.app,
            json_request("POST", "/api/news", json!({"author": "Events"}), Some(BEARER)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn pinning_through_the_api_leaves_one_pinned_post() {
        let h = harness(None);
        let mut first = post(0, true, false);
        first.is_pinned = true;
        let second = post(1, true, false);
        h.repo.seed(first.clone());
        h.repo.seed(second.clone());

        let (status, body) = send(
            &h.app,
            json_request(
                "PUT",
                "/api/news",
                json!({"id": second.id, "is_pinned": true}),
                Some(BEARER),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["post"]["is_pinned"], true);
        assert_eq!(h.repo.pinned_ids(), vec![second.id]);
    }

    #[tokio::test]
    async fn update_requires_a_known_id() {
        let h = harness(None);

        let (status, body) = send(
            &h.app,
            json_request("PUT", "/api/news", json!({"published": true}), Some(BEARER)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing post ID");

        let (status, _) = send(
            &h.app,
            json_request(
                "PUT",
                "/api/news",
                json!({"id": Uuid::new_v4(), "published": true}),
                Some(BEARER),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn permanent_delete_checks_the_id() {
        let h = harness(None);
        let victim = post(0, true, true);
        h.repo.seed(victim.clone());

        let (status, body) = send(&h.app, bare_request("DELETE", "/api/news", Some(BEARER))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing post ID");

        let uri = format!("/api/news?id={}", Uuid::new_v4());
        let (status, _) = send(&h.app, bare_request("DELETE", &uri, Some(BEARER))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/api/news?id={}", victim.id);
        let (status, body) = send(&h.app, bare_request("DELETE", &uri, Some(BEARER))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(h.repo.snapshot(victim.id).is_none());
    }

    #[tokio::test]
    async fn reorder_assigns_positions_and_is_idempotent() {
        let h = harness(None);
        let posts: Vec<Post> = (0..3).map(|i| post(i, true, false)).collect();
        posts.iter().cloned().for_each(|p| h.repo.seed(p));

        let payload = json!({
            "posts": [
                {"id": posts[1].id, "title": "ignored"},
                {"id": posts[2].id},
                {"id": posts[0].id},
            ]
        });
        for _ in 0..2 {
            let (status, body) = send(
                &h.app,
                json_request("POST", "/api/news/reorder", payload.clone(), Some(BEARER)),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
        }

        let (_, body) = send(&h.app, bare_request("GET", "/api/news", None)).await;
        assert_eq!(
            listed_ids(&body),
            vec![
                posts[1].id.to_string(),
                posts[2].id.to_string(),
                posts[0].id.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn malformed_json_bodies_get_the_error_envelope() {
        let h = harness(None);
        h.repo.seed(post(0, true, false));

        let (status, body) = send(
            &h.app,
            json_request(
                "POST",
                "/api/news/reorder",
                json!({"posts": [{"id": "not-a-uuid"}]}),
                Some(BEARER),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));

        let truncated = Request::builder()
            .method("POST")
            .uri("/api/news")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, BEARER)
            .body(Body::from("{\"title\": "))
            .expect("request must build");
        let (status, body) = send(&h.app, truncated).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(&h.app, bare_request("PUT", "/api/news", Some(BEARER))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn concurrency_limit_is_shared_across_routes() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let slow = {
            let entered = entered.clone();
            let release = release.clone();
            move || {
                let entered = entered.clone();
                let release = release.clone();
                async move {
                    entered.notify_one();
                    release.notified().await;
                    "slow"
                }
            }
        };
        let app = limit_concurrency(
            Router::new()
                .route("/slow", get(slow))
                .route("/fast", get(|| async { "fast" })),
            1,
        );

        let in_flight = tokio::spawn(app.clone().oneshot(bare_request("GET", "/slow", None)));
        entered.notified().await;

        let queued = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            app.clone().oneshot(bare_request("GET", "/fast", None)),
        )
        .await;
        assert!(queued.is_err(), "second route must wait for the held permit");

        release.notify_one();
        let slow_response = in_flight
            .await
            .expect("slow request task")
            .expect("router is infallible");
        assert_eq!(slow_response.status(), StatusCode::OK);

        let (status, _) = send(&app, bare_request("GET", "/fast", None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn verified_mode_rejects_opaque_tokens() {
        let h = harness(Some(TokenVerifier::new(SECRET)));
        let body = json!({"title": "t", "author": "a"});

        let (status, _) = send(
            &h.app,
            json_request("POST", "/api/news", body.clone(), Some(BEARER)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let expired = format!("Bearer {}", mint(SECRET, Duration::minutes(-5)));
        let (status, _) = send(
            &h.app,
            json_request("POST", "/api/news", body.clone(), Some(&expired)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let valid = format!("Bearer {}", mint(SECRET, Duration::minutes(5)));
        let (status, _) = send(
            &h.app,
            json_request("POST", "/api/news", body, Some(&valid)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn uploaded_image_is_served_back() {
        let h = harness(None);
        let boundary = "news-boundary";
        let payload = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"flyer.PNG\"\r\n\
             Content-Type: image/png\r\n\r\n\
             png-bytes\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::AUTHORIZATION, BEARER)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(payload))
            .expect("request must build");

        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        let url = body["url"].as_str().expect("url must be a string");
        let path = url
            .strip_prefix("http://news.test")
            .expect("url must use the public base");
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));

        let response = h
            .app
            .clone()
            .oneshot(bare_request("GET", path, None))
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body must be readable")
            .to_bytes();
        assert_eq!(&bytes[..], b"png-bytes");
    }

    #[tokio::test]
    async fn upload_without_file_part_is_rejected() {
        let h = harness(None);
        let boundary = "news-boundary";
        let payload = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
             hello\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::AUTHORIZATION, BEARER)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(payload))
            .expect("request must build");

        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided");
    }
}
