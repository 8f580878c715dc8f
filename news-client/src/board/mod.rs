//! Admin-side reconciler for the post list.
//!
//! [`PostBoard`] mirrors what the admin panel shows: an active grid sorted
//! pinned-first then by display order, and a separate list of soft-deleted
//! posts. Every mutation goes to the server and is followed by a refresh,
//! so the board always converges on the stored state. Grid moves are applied
//! locally first and only resynchronised when the server rejects them.

mod grid;

pub use grid::{MoveDirection, columns_for_width, move_target};

use futures::future::try_join_all;
use uuid::Uuid;

use crate::api::NewsApi;
use crate::error::{NewsClientError, NewsClientResult};
use crate::models::{ListFilter, NewPost, Post, PostPatch};

const COPY_SUFFIX: &str = " (Copy)";

#[derive(Debug, Clone, Default)]
/// Fields of a new draft.
pub struct PostDraft {
    /// Headline.
    pub title: String,
    /// Byline.
    pub author: String,
    /// Body text.
    pub content: String,
    /// Public URL of an uploaded image.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
/// Editable text fields of an existing post; `None` keeps the current value.
pub struct PostEdit {
    /// New headline.
    pub title: Option<String>,
    /// New byline.
    pub author: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// `Some(None)` removes the image.
    pub image_url: Option<Option<String>>,
}

impl PostEdit {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.content.is_none()
            && self.image_url.is_none()
    }
}

/// Client-side view of every post, kept in sync with the server.
pub struct PostBoard<A: NewsApi> {
    api: A,
    active: Vec<Post>,
    deleted: Vec<Post>,
    columns: usize,
    backend_error: Option<String>,
}

impl<A: NewsApi> PostBoard<A> {
    /// Creates an empty board laid out for a viewport `width` in pixels.
    /// Call [`PostBoard::refresh`] to load posts.
    pub fn new(api: A, width: u32) -> Self {
        Self {
            api,
            active: Vec::new(),
            deleted: Vec::new(),
            columns: columns_for_width(width),
            backend_error: None,
        }
    }

    /// The API handle the board talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Non-deleted posts, pinned first, then by display order.
    pub fn active(&self) -> &[Post] {
        &self.active
    }

    /// Soft-deleted posts in storage order.
    pub fn deleted(&self) -> &[Post] {
        &self.deleted
    }

    /// Current grid column count.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Storage failure reported by the server on the last refresh.
    pub fn backend_error(&self) -> Option<&str> {
        self.backend_error.as_deref()
    }

    /// Recomputes the column count for a new viewport width.
    pub fn resize(&mut self, width: u32) {
        self.columns = columns_for_width(width);
    }

    /// Looks a post up in either list.
    pub fn find(&self, id: Uuid) -> Option<&Post> {
        self.active
            .iter()
            .chain(self.deleted.iter())
            .find(|post| post.id == id)
    }

    /// Reloads every post and rebuilds both lists. On failure both lists are
    /// left empty.
    pub async fn refresh(&mut self) -> NewsClientResult<()> {
        match self.api.list_posts(ListFilter::Everything).await {
            Ok(response) => {
                let (active, deleted) = partition(response.posts);
                self.active = active;
                self.deleted = deleted;
                self.backend_error = response.error;
                Ok(())
            }
            Err(err) => {
                self.active.clear();
                self.deleted.clear();
                self.backend_error = None;
                Err(err)
            }
        }
    }

    /// Index an active post would move to, or `None` when the move is not
    /// allowed. Pinned posts never move.
    pub fn can_move(&self, id: Uuid, direction: MoveDirection) -> Option<usize> {
        let index = self.active.iter().position(|post| post.id == id)?;
        if self.active[index].is_pinned {
            return None;
        }
        move_target(index, self.active.len(), self.columns, direction)
    }

    /// Moves an active post one step inside its grid row and persists the
    /// new order. Returns `Ok(false)` for a move that is not allowed.
    ///
    /// The move is applied locally before the server confirms it; when the
    /// server rejects it the board is reloaded instead of rolled back.
    pub async fn move_post(&mut self, id: Uuid, direction: MoveDirection) -> NewsClientResult<bool> {
        let index = self.active_index(id)?;
        let Some(target) = self.can_move(id, direction) else {
            return Ok(false);
        };

        let post = self.active.remove(index);
        self.active.insert(target, post);
        for (position, post) in self.active.iter_mut().enumerate() {
            post.display_order = Some(i32::try_from(position).unwrap_or(i32::MAX));
        }

        let ids: Vec<Uuid> = self.active.iter().map(|post| post.id).collect();
        if let Err(err) = self.api.reorder_posts(&ids).await {
            return self.settle(Err(err)).await;
        }
        Ok(true)
    }

    /// Pins an unpinned active post, or unpins a pinned one. Pinning first
    /// unpins every other pinned post so only one stays pinned.
    pub async fn toggle_pin(&mut self, id: Uuid) -> NewsClientResult<()> {
        let pinned = self.active_post(id)?.is_pinned;

        let outcome = if pinned {
            self.api
                .update_post(id, &pin_patch(false))
                .await
                .map(|_| ())
        } else {
            let others: Vec<Uuid> = self
                .active
                .iter()
                .filter(|post| post.is_pinned && post.id != id)
                .map(|post| post.id)
                .collect();
            self.pin_exclusively(id, &others).await
        };
        self.settle(outcome).await
    }

    /// Flips the published flag.
    pub async fn toggle_publish(&mut self, id: Uuid) -> NewsClientResult<()> {
        let published = self.board_post(id)?.published;
        let patch = PostPatch {
            published: Some(!published),
            ..Default::default()
        };
        let outcome = self.api.update_post(id, &patch).await.map(|_| ());
        self.settle(outcome).await
    }

    /// Moves an active post to the deleted list. Its published flag is kept.
    pub async fn soft_delete(&mut self, id: Uuid) -> NewsClientResult<()> {
        self.active_post(id)?;
        let outcome = self
            .api
            .update_post(id, &deleted_patch(true))
            .await
            .map(|_| ());
        self.settle(outcome).await
    }

    /// Brings a soft-deleted post back with its stored published flag.
    pub async fn restore(&mut self, id: Uuid) -> NewsClientResult<()> {
        self.deleted_post(id)?;
        let outcome = self
            .api
            .update_post(id, &deleted_patch(false))
            .await
            .map(|_| ());
        self.settle(outcome).await
    }

    /// Permanently removes a soft-deleted post. Active posts must be
    /// soft-deleted first.
    pub async fn purge(&mut self, id: Uuid) -> NewsClientResult<()> {
        self.deleted_post(id)?;
        let outcome = self.api.delete_post(id).await;
        self.settle(outcome).await
    }

    /// Creates an unpublished, unpinned copy titled `"<title> (Copy)"` at the
    /// end of the active list.
    pub async fn duplicate(&mut self, id: Uuid) -> NewsClientResult<Post> {
        let source = self.board_post(id)?;
        let copy = NewPost {
            title: format!("{}{COPY_SUFFIX}", source.title),
            author: source.author.clone(),
            content: source.content.clone(),
            image_url: source.image_url.clone(),
            is_pinned: false,
            published: false,
            display_order: Some(self.next_display_order()),
        };
        let outcome = self.api.create_post(&copy).await;
        self.settle(outcome).await
    }

    /// Creates an unpublished, unpinned draft at the end of the active list.
    pub async fn create(&mut self, draft: PostDraft) -> NewsClientResult<Post> {
        let post = NewPost {
            title: draft.title,
            author: draft.author,
            content: draft.content,
            image_url: draft.image_url,
            is_pinned: false,
            published: false,
            display_order: Some(self.next_display_order()),
        };
        let outcome = self.api.create_post(&post).await;
        self.settle(outcome).await
    }

    /// Updates the text fields and image of a post.
    pub async fn edit(&mut self, id: Uuid, changes: PostEdit) -> NewsClientResult<Post> {
        self.board_post(id)?;
        if changes.is_empty() {
            return Err(NewsClientError::InvalidRequest(
                "no fields to change".to_string(),
            ));
        }
        let patch = PostPatch {
            title: changes.title,
            author: changes.author,
            content: changes.content,
            image_url: changes.image_url,
            ..Default::default()
        };
        let outcome = self.api.update_post(id, &patch).await;
        self.settle(outcome).await
    }

    async fn pin_exclusively(&self, id: Uuid, others: &[Uuid]) -> NewsClientResult<()> {
        let unpin = pin_patch(false);
        try_join_all(others.iter().map(|other| self.api.update_post(*other, &unpin))).await?;
        self.api.update_post(id, &pin_patch(true)).await?;
        Ok(())
    }

    // Reload after every server call. The server error wins over a failed reload.
    async fn settle<T>(&mut self, outcome: NewsClientResult<T>) -> NewsClientResult<T> {
        match outcome {
            Ok(value) => {
                self.refresh().await?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.refresh().await;
                Err(err)
            }
        }
    }

    fn next_display_order(&self) -> i32 {
        i32::try_from(self.active.len()).unwrap_or(i32::MAX)
    }

    fn active_index(&self, id: Uuid) -> NewsClientResult<usize> {
        self.active
            .iter()
            .position(|post| post.id == id)
            .ok_or_else(|| not_in(id, "the active list"))
    }

    fn active_post(&self, id: Uuid) -> NewsClientResult<&Post> {
        self.active_index(id).map(|index| &self.active[index])
    }

    fn deleted_post(&self, id: Uuid) -> NewsClientResult<&Post> {
        self.deleted
            .iter()
            .find(|post| post.id == id)
            .ok_or_else(|| not_in(id, "the deleted list"))
    }

    fn board_post(&self, id: Uuid) -> NewsClientResult<&Post> {
        self.find(id).ok_or_else(|| not_in(id, "the board"))
    }
}

/// Splits posts into (active, deleted). Active posts are sorted stably:
/// pinned first, then by display order with a missing order ranked as `0`.
fn partition(posts: Vec<Post>) -> (Vec<Post>, Vec<Post>) {
    let (mut active, deleted): (Vec<Post>, Vec<Post>) =
        posts.into_iter().partition(|post| !post.deleted);
    active.sort_by_key(|post| (!post.is_effectively_pinned(), post.sort_order()));
    (active, deleted)
}

fn pin_patch(is_pinned: bool) -> PostPatch {
    PostPatch {
        is_pinned: Some(is_pinned),
        ..Default::default()
    }
}

fn deleted_patch(deleted: bool) -> PostPatch {
    PostPatch {
        deleted: Some(deleted),
        ..Default::default()
    }
}

fn not_in(id: Uuid, place: &str) -> NewsClientError {
    NewsClientError::InvalidRequest(format!("post {id} is not in {place}"))
}
