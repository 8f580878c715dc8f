use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by `news-client`.
pub enum NewsClientError {
    /// Transport failure (`reqwest`): connection, timeout, malformed body.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// No token was configured, or the server refused it.
    #[error("unauthorized")]
    Unauthorized,

    /// The server does not know the requested post.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected as invalid, or a local precondition failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The server failed while handling the request; the storage message is kept.
    #[error("server error: {0}")]
    Server(String),
}

/// Result of `news-client` operations.
pub type NewsClientResult<T> = Result<T, NewsClientError>;

impl NewsClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("http status {status}"));
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(message),
            status if status.is_server_error() => Self::Server(message),
            _ => Self::InvalidRequest(message),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }
}
