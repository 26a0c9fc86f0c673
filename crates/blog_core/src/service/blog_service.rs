//! Blog page service.
//!
//! # Responsibility
//! - Build the data for each page (home feed, post detail, tag filter).
//! - Translate repository lookups that came back empty into page errors.
//!
//! # Invariants
//! - Popular posts, fresh posts and popular tags are capped at 5 items.
//! - Tag filter pages list at most 20 posts.
//! - Serialization only reads precomputed counts.

use crate::repo::blog_repo::{BlogRepository, RepoError};
use crate::service::serialize::{
    serialize_post, serialize_post_detail, serialize_tag, PostCard, PostDetail, TagCard,
};
use log::debug;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const POPULAR_POSTS_LIMIT: u32 = 5;
pub const FRESH_POSTS_LIMIT: u32 = 5;
pub const POPULAR_TAGS_LIMIT: u32 = 5;
pub const TAG_POSTS_LIMIT: u32 = 20;

/// Default URL prefix under which post images are served.
pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// Service error for page use-cases.
#[derive(Debug)]
pub enum ServiceError {
    PostNotFound(String),
    TagNotFound(String),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostNotFound(slug) => write!(f, "post not found: `{slug}`"),
            Self::TagNotFound(title) => write!(f, "tag not found: `{title}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Home feed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexPage {
    pub most_popular_posts: Vec<PostCard>,
    /// Most recent posts, oldest first.
    pub page_posts: Vec<PostCard>,
    pub popular_tags: Vec<TagCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetailPage {
    pub post: PostDetail,
    pub popular_tags: Vec<TagCard>,
    pub most_popular_posts: Vec<PostCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFilterPage {
    pub tag: String,
    pub popular_tags: Vec<TagCard>,
    pub posts: Vec<PostCard>,
    pub most_popular_posts: Vec<PostCard>,
}

/// Page service facade over repository implementations.
pub struct BlogService<R: BlogRepository> {
    repo: R,
    media_url: String,
}

impl<R: BlogRepository> BlogService<R> {
    /// Creates a service serving images under `DEFAULT_MEDIA_URL`.
    pub fn new(repo: R) -> Self {
        Self::with_media_url(repo, DEFAULT_MEDIA_URL)
    }

    pub fn with_media_url(repo: R, media_url: impl Into<String>) -> Self {
        Self {
            repo,
            media_url: media_url.into(),
        }
    }

    /// Gives write access to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn index_page(&self) -> Result<IndexPage, ServiceError> {
        let most_popular_posts = self.popular_posts()?;
        let page_posts = self
            .repo
            .fresh_posts(FRESH_POSTS_LIMIT)?
            .iter()
            .map(|post| serialize_post(post, &self.media_url))
            .collect();
        let popular_tags = self.popular_tags()?;

        Ok(IndexPage {
            most_popular_posts,
            page_posts,
            popular_tags,
        })
    }

    pub fn post_detail_page(&self, slug: &str) -> Result<PostDetailPage, ServiceError> {
        let post = self
            .repo
            .find_post_by_slug(slug)?
            .ok_or_else(|| ServiceError::PostNotFound(slug.to_string()))?;
        let comments = self.repo.comments_for_post(post.id)?;
        debug!(
            "event=post_detail module=service status=ok post_id={} comments={}",
            post.id,
            comments.len()
        );

        Ok(PostDetailPage {
            post: serialize_post_detail(&post, &comments, &self.media_url),
            popular_tags: self.popular_tags()?,
            most_popular_posts: self.popular_posts()?,
        })
    }

    /// Lists up to `TAG_POSTS_LIMIT` posts carrying the tag titled `tag_title`.
    ///
    /// A tag with no posts yields an empty list, not an error.
    pub fn tag_filter_page(&self, tag_title: &str) -> Result<TagFilterPage, ServiceError> {
        let tag = self
            .repo
            .find_tag_by_title(tag_title)?
            .ok_or_else(|| ServiceError::TagNotFound(tag_title.to_string()))?;
        let posts = self
            .repo
            .posts_with_tag(tag.id, TAG_POSTS_LIMIT)?
            .iter()
            .map(|post| serialize_post(post, &self.media_url))
            .collect();

        Ok(TagFilterPage {
            tag: tag.title,
            popular_tags: self.popular_tags()?,
            posts,
            most_popular_posts: self.popular_posts()?,
        })
    }

    fn popular_posts(&self) -> Result<Vec<PostCard>, ServiceError> {
        Ok(self
            .repo
            .popular_posts(POPULAR_POSTS_LIMIT)?
            .iter()
            .map(|post| serialize_post(post, &self.media_url))
            .collect())
    }

    fn popular_tags(&self) -> Result<Vec<TagCard>, ServiceError> {
        Ok(self
            .repo
            .popular_tags(POPULAR_TAGS_LIMIT)?
            .iter()
            .map(serialize_tag)
            .collect())
    }
}
