use tracing::{error, info};
use uuid::Uuid;

use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{CreatePostRequest, ListVisibility, Post, UpdatePostRequest};

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<Post>,
    /// Set when storage failed; `posts` is then empty.
    pub(crate) error: Option<String>,
}

pub(crate) struct NewsService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> NewsService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Never fails: a storage error degrades to an empty listing so the
    /// public page keeps rendering.
    pub(crate) async fn list_posts(&self, visibility: ListVisibility) -> ListPostsResult {
        match self.repo.list_posts(visibility).await {
            Ok(mut posts) => {
                posts.retain(|post| visibility.admits(post));
                info!(?visibility, count = posts.len(), "listed news posts");
                ListPostsResult { posts, error: None }
            }
            Err(err) => {
                error!(?visibility, error = %err, "listing news posts failed");
                ListPostsResult {
                    posts: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    pub(crate) async fn create_post(&self, req: CreatePostRequest) -> Result<Post, DomainError> {
        let req = req.validate()?;

        let display_order = match req.display_order {
            Some(order) => order,
            None => {
                let count = self.repo.count_active_posts().await?;
                i32::try_from(count).unwrap_or(i32::MAX)
            }
        };

        let new_post = NewPost {
            title: req.title,
            author: req.author,
            content: req.content,
            image_url: req.image_url,
            is_pinned: req.is_pinned.unwrap_or(false),
            published: req.published.unwrap_or(false),
            display_order,
        };
        let post = self.repo.create_post(new_post).await?;
        info!(post_id = %post.id, "news post created");
        Ok(post)
    }

    pub(crate) async fn update_post(
        &self,
        post_id: Uuid,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        if req.pins() {
            info!(%post_id, "pinning post, other pins are cleared");
        }

        let patch = PostPatch {
            title: req.title,
            author: req.author,
            content: req.content,
            image_url: req.image_url,
            is_pinned: req.is_pinned,
            published: req.published,
            deleted: req.deleted,
            display_order: req.display_order,
        };
        self.repo
            .update_post(post_id, patch)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {post_id}")))
    }

    /// Removes the row for good. Any referenced image stays in object storage.
    pub(crate) async fn delete_post(&self, post_id: Uuid) -> Result<(), DomainError> {
        let deleted = self.repo.delete_post(post_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }
        info!(%post_id, "news post permanently deleted");
        Ok(())
    }

    pub(crate) async fn reorder_posts(&self, ids: &[Uuid]) -> Result<(), DomainError> {
        let touched = self.repo.reorder_posts(ids).await?;
        info!(requested = ids.len(), touched, "news posts reordered");
        Ok(())
    }
}
