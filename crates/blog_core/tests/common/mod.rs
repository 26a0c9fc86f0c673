#![allow(dead_code)]

use blog_core::{BlogRepository, NewComment, NewPost, PostId, SqliteBlogRepository, UserId};

pub const HOUR_MS: i64 = 60 * 60 * 1000;

pub fn user(repo: &SqliteBlogRepository<'_>, username: &str) -> UserId {
    repo.create_user(username).unwrap()
}

/// Creates a post published `hour` hours after the epoch, tagged with `tags`.
pub fn post(
    repo: &SqliteBlogRepository<'_>,
    author: UserId,
    slug: &str,
    hour: i64,
    tags: &[&str],
) -> PostId {
    let id = repo
        .create_post(&NewPost::new(
            author,
            slug,
            format!("Title of {slug}"),
            format!("Body of {slug}"),
            hour * HOUR_MS,
        ))
        .unwrap();
    let tags: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
    repo.set_post_tags(id, &tags).unwrap();
    id
}

pub fn likes(repo: &SqliteBlogRepository<'_>, post_id: PostId, amount: usize) {
    for idx in 0..amount {
        let fan = repo.create_user(&format!("fan-{post_id}-{idx}")).unwrap();
        repo.like_post(post_id, fan).unwrap();
    }
}

pub fn comments(repo: &SqliteBlogRepository<'_>, post_id: PostId, author: UserId, amount: usize) {
    for idx in 0..amount {
        repo.add_comment(&NewComment {
            post_id,
            author_id: author,
            text: format!("comment {idx}"),
            published_at: idx as i64,
        })
        .unwrap();
    }
}
