use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A news post as stored by the server.
pub struct Post {
    /// Storage-generated identifier.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Byline.
    pub author: String,
    /// Body text, may be empty.
    pub content: String,
    /// Public URL of the attached image.
    pub image_url: Option<String>,
    /// Forced to the front of listings; at most one post at a time.
    pub is_pinned: bool,
    /// Visible on the public feed.
    pub published: bool,
    /// Soft-deleted.
    pub deleted: bool,
    /// Rank among active, non-pinned posts.
    pub display_order: Option<i32>,
    /// Creation time (UTC).
    pub created_at: DateTime<Utc>,
    /// Last write time (UTC).
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// A deleted post never counts as pinned, whatever its stored flag says.
    pub fn is_effectively_pinned(&self) -> bool {
        self.is_pinned && !self.deleted
    }

    /// Sort key among non-pinned posts; a missing order ranks as `0`.
    pub fn sort_order(&self) -> i32 {
        self.display_order.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
/// Payload of the create operation.
pub struct NewPost {
    /// Headline, must not be blank.
    pub title: String,
    /// Byline, must not be blank.
    pub author: String,
    /// Body text.
    pub content: String,
    /// Public URL of the attached image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Pin the new post (the server unpins the previous one).
    pub is_pinned: bool,
    /// Publish immediately.
    pub published: bool,
    /// Explicit rank; the server appends at the end when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
/// Partial update; `None` fields are not sent and stay untouched.
pub struct PostPatch {
    /// New headline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New byline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// New body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `Some(None)` clears the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    /// Pin or unpin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    /// Publish or unpublish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// Soft-delete or restore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// New rank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which posts a listing returns.
pub enum ListFilter {
    /// Published, non-deleted posts only.
    Public,
    /// Every non-deleted post, drafts included.
    Admin,
    /// Everything, soft-deleted posts included.
    Everything,
}

impl ListFilter {
    pub(crate) fn query(self) -> Vec<(&'static str, &'static str)> {
        match self {
            Self::Public => Vec::new(),
            Self::Admin => vec![("includeUnpublished", "true")],
            Self::Everything => vec![("includeUnpublished", "true"), ("includeDeleted", "true")],
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Result of a listing.
pub struct ListPostsResponse {
    /// Posts in storage order.
    pub posts: Vec<Post>,
    /// Storage failure reported by the server; `posts` is then empty.
    pub error: Option<String>,
}
