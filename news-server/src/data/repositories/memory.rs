use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{ListVisibility, Post};

/// Table stand-in for router and service tests. Mirrors the ordering and the
/// pin swap of the PostgreSQL repository.
#[derive(Clone, Default)]
pub(crate) struct InMemoryPostRepository {
    rows: Arc<Mutex<Vec<Post>>>,
    fail_reads: Arc<Mutex<bool>>,
}

impl InMemoryPostRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed(&self, post: Post) {
        self.rows.lock().expect("rows mutex poisoned").push(post);
    }

    pub(crate) fn fail_reads(&self) {
        *self.fail_reads.lock().expect("fail_reads mutex poisoned") = true;
    }

    pub(crate) fn snapshot(&self, id: Uuid) -> Option<Post> {
        self.rows
            .lock()
            .expect("rows mutex poisoned")
            .iter()
            .find(|post| post.id == id)
            .cloned()
    }

    pub(crate) fn pinned_ids(&self) -> Vec<Uuid> {
        self.rows
            .lock()
            .expect("rows mutex poisoned")
            .iter()
            .filter(|post| post.is_pinned)
            .map(|post| post.id)
            .collect()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        if input.is_pinned {
            rows.iter_mut().for_each(|post| post.is_pinned = false);
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: input.title,
            author: input.author,
            content: input.content,
            image_url: input.image_url,
            is_pinned: input.is_pinned,
            published: input.published,
            deleted: false,
            display_order: Some(input.display_order),
            created_at: now,
            updated_at: now,
        };
        rows.push(post.clone());
        Ok(post.from_storage())
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        if !rows.iter().any(|post| post.id == id) {
            return Ok(None);
        }

        if patch.is_pinned == Some(true) {
            rows.iter_mut()
                .filter(|post| post.id != id)
                .for_each(|post| post.is_pinned = false);
        }

        let Some(post) = rows.iter_mut().find(|post| post.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(author) = patch.author {
            post.author = author;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(image_url) = patch.image_url {
            post.image_url = image_url;
        }
        if let Some(is_pinned) = patch.is_pinned {
            post.is_pinned = is_pinned;
        }
        if let Some(published) = patch.published {
            post.published = published;
        }
        if let Some(deleted) = patch.deleted {
            post.deleted = deleted;
        }
        if let Some(display_order) = patch.display_order {
            post.display_order = Some(display_order);
        }
        post.updated_at = Utc::now();

        Ok(Some(post.clone().from_storage()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        let before = rows.len();
        rows.retain(|post| post.id != id);
        Ok(rows.len() < before)
    }

    async fn list_posts(&self, visibility: ListVisibility) -> Result<Vec<Post>, DomainError> {
        if *self.fail_reads.lock().expect("fail_reads mutex poisoned") {
            return Err(DomainError::Storage("connection refused".to_string()));
        }

        let mut posts: Vec<Post> = self
            .rows
            .lock()
            .expect("rows mutex poisoned")
            .iter()
            .filter(|post| visibility.admits(post))
            .cloned()
            .map(Post::from_storage)
            .collect();
        posts.sort_by(storage_order);
        Ok(posts)
    }

    async fn count_active_posts(&self) -> Result<i64, DomainError> {
        let rows = self.rows.lock().expect("rows mutex poisoned");
        Ok(rows.iter().filter(|post| !post.deleted).count() as i64)
    }

    async fn reorder_posts(&self, ids: &[Uuid]) -> Result<u64, DomainError> {
        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        let mut touched = 0;
        for (position, id) in ids.iter().enumerate() {
            if let Some(post) = rows.iter_mut().find(|post| post.id == *id) {
                post.display_order = Some(position as i32);
                touched += 1;
            }
        }
        Ok(touched)
    }
}

// is_pinned DESC, display_order ASC NULLS LAST, created_at DESC
fn storage_order(a: &Post, b: &Post) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| match (a.display_order, b.display_order) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}
