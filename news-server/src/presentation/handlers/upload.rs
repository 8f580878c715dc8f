use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::presentation::AppState;
use crate::presentation::app_error::{AppError, AppResult};
use crate::presentation::middleware::auth::AdminSession;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UploadResponseDto {
    pub(crate) url: String,
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "upload",
    security(
        ("bearer_auth" = [])
    ),
    request_body(
        content = Vec<u8>,
        content_type = "multipart/form-data",
        description = "Form with a single `file` part"
    ),
    responses(
        (status = 200, description = "Image stored", body = UploadResponseDto),
        (status = 400, description = "No file provided"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Storage error")
    )
)]
pub(crate) async fn upload_image(
    State(state): State<AppState>,
    session: AdminSession,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponseDto>)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart payload: {err}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read upload: {err}")))?;
        upload = Some((file_name, content_type, data));
        break;
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let url = state
        .upload_service
        .upload_image(&file_name, content_type.as_deref(), &data)
        .await?;

    info!(actor = session.actor(), %url, "image uploaded");
    Ok((StatusCode::OK, Json(UploadResponseDto { url })))
}
