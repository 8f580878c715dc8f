use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

/// Caller of a mutating route. `subject` is only known when tokens are verified.
#[derive(Debug, Clone)]
pub(crate) struct AdminSession {
    pub(crate) subject: Option<String>,
}

impl AdminSession {
    pub(crate) fn actor(&self) -> &str {
        self.subject.as_deref().unwrap_or("unverified")
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

pub(crate) async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        warn!(path = %request.uri().path(), "missing bearer token");
        AppError::Unauthorized
    })?;

    let subject = match &state.tokens {
        Some(verifier) => {
            let claims = verifier.verify_token(&token).map_err(|err| {
                warn!(error = %err, "bearer token rejected");
                AppError::Unauthorized
            })?;
            Some(claims.sub)
        }
        None => None,
    };

    request.extensions_mut().insert(AdminSession { subject });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.to_string())
}
