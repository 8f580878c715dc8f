use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

const TITLE_MAX_LEN: usize = 255;
const AUTHOR_MAX_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) image_url: Option<String>,
    pub(crate) is_pinned: bool,
    pub(crate) published: bool,
    pub(crate) deleted: bool,
    pub(crate) display_order: Option<i32>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Post {
    /// Tidies a post loaded from storage. Rows that predate the write-side
    /// checks are passed through rather than rejected, so one legacy row can
    /// never empty a listing.
    pub(crate) fn from_storage(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            image_url: normalize_image_url(self.image_url),
            ..self
        }
    }

    pub(crate) fn is_publicly_visible(&self) -> bool {
        self.published && !self.deleted
    }
}

/// Which slice of the table a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListVisibility {
    /// Published and not deleted.
    Public,
    /// Everything that is not deleted.
    Admin,
    /// No filter at all.
    Everything,
}

impl ListVisibility {
    pub(crate) fn from_flags(include_unpublished: bool, include_deleted: bool) -> Self {
        match (include_unpublished, include_deleted) {
            (false, _) => Self::Public,
            (true, false) => Self::Admin,
            (true, true) => Self::Everything,
        }
    }

    pub(crate) fn admits(self, post: &Post) -> bool {
        match self {
            Self::Public => post.is_publicly_visible(),
            Self::Admin => !post.deleted,
            Self::Everything => true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) image_url: Option<String>,
    pub(crate) is_pinned: Option<bool>,
    pub(crate) published: Option<bool>,
    pub(crate) display_order: Option<i32>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            author: normalize_author(&self.author)?,
            image_url: normalize_image_url(self.image_url),
            ..self
        })
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) content: Option<String>,
    /// `Some(None)` clears the image reference.
    pub(crate) image_url: Option<Option<String>>,
    pub(crate) is_pinned: Option<bool>,
    pub(crate) published: Option<bool>,
    pub(crate) deleted: Option<bool>,
    pub(crate) display_order: Option<i32>,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let title = self.title.as_deref().map(normalize_title).transpose()?;
        let author = self.author.as_deref().map(normalize_author).transpose()?;

        Ok(Self {
            title,
            author,
            image_url: self.image_url.map(normalize_image_url),
            ..self
        })
    }

    pub(crate) fn pins(&self) -> bool {
        self.is_pinned == Some(true)
    }
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX_LEN {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..255 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_author(author: &str) -> Result<String, DomainError> {
    let author = author.trim();
    if author.is_empty() || author.chars().count() > AUTHOR_MAX_LEN {
        return Err(DomainError::Validation {
            field: "author",
            message: "must be 1..255 chars",
        });
    }
    Ok(author.to_string())
}

// The admin form posts an empty string when no image was chosen.
fn normalize_image_url(image_url: Option<String>) -> Option<String> {
    image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}
