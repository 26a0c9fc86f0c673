//! Core domain logic for the blog.
//! Storage, page queries and display mappings live here; HTTP lives in
//! `blog_web`.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::post::{ModelValidationError, NewComment, NewPost, PostId, TagId, UserId};
pub use repo::blog_repo::{
    BlogRepository, CommentRecord, PostRecord, RepoError, RepoResult, SqliteBlogRepository,
    TagRecord,
};
pub use service::blog_service::{
    BlogService, IndexPage, PostDetailPage, ServiceError, TagFilterPage,
};
pub use service::serialize::{CommentView, PostCard, PostDetail, TagCard};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
