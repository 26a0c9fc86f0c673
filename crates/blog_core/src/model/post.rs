//! Post/tag/comment records and their validation rules.
//!
//! # Responsibility
//! - Describe the shape of entities accepted by repository write paths.
//! - Keep validation rules close to the data they guard.
//!
//! # Invariants
//! - `slug` matches `[A-Za-z0-9_-]+`.
//! - `published_at` is stored as Unix epoch milliseconds.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid slug regex"));

pub type UserId = i64;
pub type PostId = i64;
pub type TagId = i64;
pub type CommentId = i64;

/// Validation failure for write-side records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    BlankUsername,
    BlankTitle,
    BlankTagTitle,
    BlankCommentText,
    InvalidSlug(String),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUsername => write!(f, "username cannot be blank"),
            Self::BlankTitle => write!(f, "post title cannot be blank"),
            Self::BlankTagTitle => write!(f, "tag title cannot be blank"),
            Self::BlankCommentText => write!(f, "comment text cannot be blank"),
            Self::InvalidSlug(slug) => write!(f, "slug `{slug}` is not URL-safe"),
        }
    }
}

impl Error for ModelValidationError {}

/// Post accepted by the write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    /// Full body text.
    pub text: String,
    pub author_id: UserId,
    /// Path of the cover image relative to the media root.
    pub image: Option<String>,
    /// Unix epoch milliseconds.
    pub published_at: i64,
    pub slug: String,
}

impl NewPost {
    /// Creates a post without image; `published_at` must be set by caller.
    pub fn new(
        author_id: UserId,
        slug: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        published_at: i64,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            author_id,
            image: None,
            published_at,
            slug: slug.into(),
        }
    }

    /// Attaches a cover image path.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTitle);
        }
        validate_slug(&self.slug)
    }
}

/// Comment accepted by the write path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    /// Unix epoch milliseconds.
    pub published_at: i64,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.text.trim().is_empty() {
            return Err(ModelValidationError::BlankCommentText);
        }
        Ok(())
    }
}

/// Checks that a slug can be embedded in a URL path segment as-is.
pub fn validate_slug(slug: &str) -> Result<(), ModelValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ModelValidationError::InvalidSlug(slug.to_string()))
    }
}

/// Trims a tag title and rejects blank values.
pub fn normalize_tag_title(title: &str) -> Result<String, ModelValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(ModelValidationError::BlankTagTitle)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trims a username and rejects blank values.
pub fn normalize_username(username: &str) -> Result<String, ModelValidationError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        Err(ModelValidationError::BlankUsername)
    } else {
        Ok(trimmed.to_string())
    }
}
