use axum::extract::FromRequest;

use crate::presentation::app_error::AppError;

/// `axum::Json` whose rejections render as the usual `{ "error": ... }` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub(crate) struct ApiJson<T>(pub(crate) T);
