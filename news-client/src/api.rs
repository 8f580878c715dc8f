use async_trait::async_trait;
use uuid::Uuid;

use crate::error::NewsClientResult;
use crate::models::{ListFilter, ListPostsResponse, NewPost, Post, PostPatch};

/// Post operations the board drives. Implemented by [`crate::NewsClient`].
#[async_trait]
pub trait NewsApi: Send + Sync {
    /// Lists posts visible under `filter`.
    async fn list_posts(&self, filter: ListFilter) -> NewsClientResult<ListPostsResponse>;

    /// Creates a post and returns it with its generated fields.
    async fn create_post(&self, post: &NewPost) -> NewsClientResult<Post>;

    /// Applies `patch` to post `id`.
    async fn update_post(&self, id: Uuid, patch: &PostPatch) -> NewsClientResult<Post>;

    /// Removes post `id` for good.
    async fn delete_post(&self, id: Uuid) -> NewsClientResult<()>;

    /// Rewrites display order so each id gets its position in `ids`.
    async fn reorder_posts(&self, ids: &[Uuid]) -> NewsClientResult<()>;
}
