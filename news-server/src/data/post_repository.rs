use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::{ListVisibility, Post};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) image_url: Option<String>,
    pub(crate) is_pinned: bool,
    pub(crate) published: bool,
    pub(crate) display_order: i32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PostPatch {
    pub(crate) title: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<Option<String>>,
    pub(crate) is_pinned: Option<bool>,
    pub(crate) published: Option<bool>,
    pub(crate) deleted: Option<bool>,
    pub(crate) display_order: Option<i32>,
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    /// Inserts a row. Pinning on insert unpins every other post in the same transaction.
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    /// Applies only the present fields. Pinning unpins every other post in the same transaction.
    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError>;
    /// Rows ordered pinned first, then display order, then newest first.
    async fn list_posts(&self, visibility: ListVisibility) -> Result<Vec<Post>, DomainError>;
    async fn count_active_posts(&self) -> Result<i64, DomainError>;
    /// Sets `display_order` to the position of each id, atomically. Returns rows touched.
    async fn reorder_posts(&self, ids: &[Uuid]) -> Result<u64, DomainError>;
}

#[async_trait]
impl<T> PostRepository for Arc<T>
where
    T: PostRepository + ?Sized,
{
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        (**self).create_post(input).await
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        (**self).update_post(id, patch).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError> {
        (**self).delete_post(id).await
    }

    async fn list_posts(&self, visibility: ListVisibility) -> Result<Vec<Post>, DomainError> {
        (**self).list_posts(visibility).await
    }

    async fn count_active_posts(&self) -> Result<i64, DomainError> {
        (**self).count_active_posts().await
    }

    async fn reorder_posts(&self, ids: &[Uuid]) -> Result<u64, DomainError> {
        (**self).reorder_posts(ids).await
    }
}
