use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::application::news_service::ListPostsResult;
use crate::domain::post::{CreatePostRequest, ListVisibility, Post, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppError, AppResult};
use crate::presentation::json::ApiJson;
use crate::presentation::middleware::auth::AdminSession;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub(crate) struct ListNewsQuery {
    /// `true` to include drafts (admin views).
    pub(crate) include_unpublished: Option<String>,
    /// `true` to include soft-deleted posts; only honoured with `includeUnpublished`.
    pub(crate) include_deleted: Option<String>,
}

impl ListNewsQuery {
    fn visibility(&self) -> ListVisibility {
        ListVisibility::from_flags(
            flag_is_set(self.include_unpublished.as_deref()),
            flag_is_set(self.include_deleted.as_deref()),
        )
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct DeleteNewsQuery {
    pub(crate) id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub(crate) author: String,
    #[serde(default)]
    pub(crate) content: String,
    pub(crate) image_url: Option<String>,
    pub(crate) is_pinned: Option<bool>,
    pub(crate) published: Option<bool>,
    pub(crate) display_order: Option<i32>,
}

/// `{ id, ...fields }`; absent fields are left untouched.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    pub(crate) id: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub(crate) author: Option<String>,
    pub(crate) content: Option<String>,
    /// `null` clears the image reference.
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub(crate) image_url: Option<Option<String>>,
    pub(crate) is_pinned: Option<bool>,
    pub(crate) published: Option<bool>,
    pub(crate) deleted: Option<bool>,
    pub(crate) display_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct PostRefDto {
    pub(crate) id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ReorderPostsDto {
    /// Desired order; every other field of the entries is ignored.
    pub(crate) posts: Vec<PostRefDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) image_url: Option<String>,
    pub(crate) is_pinned: bool,
    pub(crate) published: bool,
    pub(crate) deleted: bool,
    pub(crate) display_order: Option<i32>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostEnvelopeDto {
    pub(crate) post: PostDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SuccessDto {
    pub(crate) success: bool,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            author: post.author,
            content: post.content,
            image_url: post.image_url,
            is_pinned: post.is_pinned,
            published: post.published,
            deleted: post.deleted,
            display_order: post.display_order,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<ListPostsResult> for ListPostsResponseDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostDto::from).collect(),
            error: result.error,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/news",
    tag = "news",
    params(ListNewsQuery),
    responses(
        (status = 200, description = "Posts listed; `error` is set when storage failed", body = ListPostsResponseDto)
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListNewsQuery>,
) -> (StatusCode, Json<ListPostsResponseDto>) {
    let result = state.news_service.list_posts(query.visibility()).await;
    (StatusCode::OK, Json(ListPostsResponseDto::from(result)))
}

#[utoipa::path(
    post,
    path = "/api/news",
    tag = "news",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 200, description = "Post created", body = PostEnvelopeDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Storage error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(dto): ApiJson<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostEnvelopeDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        author: dto.author,
        content: dto.content,
        image_url: dto.image_url,
        is_pinned: dto.is_pinned,
        published: dto.published,
        display_order: dto.display_order,
    };

    let post = state.news_service.create_post(req).await?;
    info!(actor = session.actor(), post_id = %post.id, "create via api");
    Ok((
        StatusCode::OK,
        Json(PostEnvelopeDto {
            post: PostDto::from(post),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/news",
    tag = "news",
    security(
        ("bearer_auth" = [])
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostEnvelopeDto),
        (status = 400, description = "Missing id or validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Storage error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(dto): ApiJson<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostEnvelopeDto>)> {
    dto.validate()?;
    let id = parse_post_id(dto.id.as_deref())?;
    let req = UpdatePostRequest {
        title: dto.title,
        author: dto.author,
        content: dto.content,
        image_url: dto.image_url,
        is_pinned: dto.is_pinned,
        published: dto.published,
        deleted: dto.deleted,
        display_order: dto.display_order,
    };

    let post = state.news_service.update_post(id, req).await?;
    info!(actor = session.actor(), post_id = %post.id, "update via api");
    Ok((
        StatusCode::OK,
        Json(PostEnvelopeDto {
            post: PostDto::from(post),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/news",
    tag = "news",
    security(
        ("bearer_auth" = [])
    ),
    params(DeleteNewsQuery),
    responses(
        (status = 200, description = "Post permanently deleted", body = SuccessDto),
        (status = 400, description = "Missing post ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Storage error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    session: AdminSession,
    Query(query): Query<DeleteNewsQuery>,
) -> AppResult<(StatusCode, Json<SuccessDto>)> {
    let id = parse_post_id(query.id.as_deref())?;

    state.news_service.delete_post(id).await?;
    info!(actor = session.actor(), post_id = %id, "permanent delete via api");
    Ok((StatusCode::OK, Json(SuccessDto { success: true })))
}

#[utoipa::path(
    post,
    path = "/api/news/reorder",
    tag = "news",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ReorderPostsDto,
    responses(
        (status = 200, description = "Display order rewritten", body = SuccessDto),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Storage error")
    )
)]
pub(crate) async fn reorder_posts(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(dto): ApiJson<ReorderPostsDto>,
) -> AppResult<(StatusCode, Json<SuccessDto>)> {
    let ids: Vec<Uuid> = dto.posts.into_iter().map(|post| post.id).collect();

    state.news_service.reorder_posts(&ids).await?;
    info!(actor = session.actor(), count = ids.len(), "reorder via api");
    Ok((StatusCode::OK, Json(SuccessDto { success: true })))
}

fn flag_is_set(raw: Option<&str>) -> bool {
    raw == Some("true")
}

fn parse_post_id(raw: Option<&str>) -> AppResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing post ID".to_string()))?;

    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid post ID: {raw}")))
}

// Distinguishes an explicit `null` (clear) from an absent field (keep).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
