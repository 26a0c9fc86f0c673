//! Display mappings handed to page templates.
//!
//! Every mapping is built from read models that already carry their
//! aggregate counts, so serialization never touches storage.

use crate::repo::blog_repo::{CommentRecord, PostRecord, TagRecord};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Maximum teaser length, in characters.
pub const TEASER_MAX_CHARS: usize = 200;

// Characters left as-is inside one URL path segment (RFC 3986 unreserved).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCard {
    pub title: String,
    pub posts_with_tag: u32,
}

/// Post as shown in feeds and side lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub title: String,
    pub teaser_text: String,
    pub author: String,
    pub comments_amount: u32,
    pub image_url: Option<String>,
    pub published_at: i64,
    pub slug: String,
    pub tags: Vec<TagCard>,
    /// `None` for posts without tags.
    pub first_tag_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub text: String,
    pub published_at: i64,
    pub author: String,
}

/// Post as shown on its own page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    pub title: String,
    pub text: String,
    pub author: String,
    pub comments: Vec<CommentView>,
    pub likes_amount: u32,
    pub image_url: Option<String>,
    pub published_at: i64,
    pub slug: String,
    pub tags: Vec<TagCard>,
}

pub fn serialize_tag(tag: &TagRecord) -> TagCard {
    TagCard {
        title: tag.title.clone(),
        posts_with_tag: tag.posts_count,
    }
}

pub fn serialize_post(post: &PostRecord, media_url: &str) -> PostCard {
    PostCard {
        title: post.title.clone(),
        teaser_text: teaser(&post.text),
        author: post.author.clone(),
        comments_amount: post.comments_count,
        image_url: image_url(media_url, post.image.as_deref()),
        published_at: post.published_at,
        slug: post.slug.clone(),
        tags: post.tags.iter().map(serialize_tag).collect(),
        first_tag_title: post.tags.first().map(|tag| tag.title.clone()),
    }
}

pub fn serialize_post_detail(
    post: &PostRecord,
    comments: &[CommentRecord],
    media_url: &str,
) -> PostDetail {
    PostDetail {
        title: post.title.clone(),
        text: post.text.clone(),
        author: post.author.clone(),
        comments: comments
            .iter()
            .map(|comment| CommentView {
                text: comment.text.clone(),
                published_at: comment.published_at,
                author: comment.author.clone(),
            })
            .collect(),
        likes_amount: post.likes_count,
        image_url: image_url(media_url, post.image.as_deref()),
        published_at: post.published_at,
        slug: post.slug.clone(),
        tags: post.tags.iter().map(serialize_tag).collect(),
    }
}

/// First `TEASER_MAX_CHARS` characters of `text`.
pub fn teaser(text: &str) -> String {
    text.chars().take(TEASER_MAX_CHARS).collect()
}

/// Joins the media URL prefix and a stored image path.
///
/// Each path segment is percent-encoded; `/` separators are kept.
pub fn image_url(media_url: &str, image: Option<&str>) -> Option<String> {
    let image = image.map(str::trim).filter(|value| !value.is_empty())?;
    let encoded = image
        .trim_start_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    Some(format!("{}/{}", media_url.trim_end_matches('/'), encoded))
}
