//! Client library for `news-server`.
//!
//! [`NewsClient`] wraps the REST API over HTTP (`reqwest`) and keeps the
//! bearer token used by the mutating operations. [`board::PostBoard`] is the
//! admin-side reconciler: it keeps the active and deleted post lists in sync
//! with the server, computes legal grid moves and drives the pin, publish,
//! delete, restore and duplicate transitions.
#![warn(missing_docs)]

mod api;
pub mod board;
mod error;
mod http_client;
mod models;

pub use api::NewsApi;
pub use error::{NewsClientError, NewsClientResult};
pub use models::{ListFilter, ListPostsResponse, NewPost, Post, PostPatch};

use async_trait::async_trait;
use http_client::HttpClient;
use uuid::Uuid;

#[derive(Debug, Clone)]
/// HTTP client for the news API.
pub struct NewsClient {
    http_client: HttpClient,
    token: Option<String>,
}

impl NewsClient {
    /// Creates a client for the server at `base_url`, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> NewsClientResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(base_url)?,
            token: None,
        })
    }

    /// Sets the bearer token sent with mutating requests.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Returns the current token, if any.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Forgets the stored token.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Lists the public feed: published, non-deleted posts. Needs no token.
    pub async fn public_feed(&self) -> NewsClientResult<ListPostsResponse> {
        self.http_client.list_posts(ListFilter::Public).await
    }

    /// Uploads an image and returns its public URL, ready for `image_url`.
    ///
    /// Requires a token.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> NewsClientResult<String> {
        let token = self.require_token()?;
        self.http_client
            .upload_image(token, file_name, content_type, data)
            .await
    }

    fn require_token(&self) -> NewsClientResult<&str> {
        self.token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(NewsClientError::Unauthorized)
    }
}

#[async_trait]
impl NewsApi for NewsClient {
    async fn list_posts(&self, filter: ListFilter) -> NewsClientResult<ListPostsResponse> {
        self.http_client.list_posts(filter).await
    }

    async fn create_post(&self, post: &NewPost) -> NewsClientResult<Post> {
        let token = self.require_token()?;
        self.http_client.create_post(token, post).await
    }

    async fn update_post(&self, id: Uuid, patch: &PostPatch) -> NewsClientResult<Post> {
        let token = self.require_token()?;
        self.http_client.update_post(token, id, patch).await
    }

    async fn delete_post(&self, id: Uuid) -> NewsClientResult<()> {
        let token = self.require_token()?;
        self.http_client.delete_post(token, id).await
    }

    async fn reorder_posts(&self, ids: &[Uuid]) -> NewsClientResult<()> {
        let token = self.require_token()?;
        self.http_client.reorder_posts(token, ids).await
    }
}
