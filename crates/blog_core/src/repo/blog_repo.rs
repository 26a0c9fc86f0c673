//! Blog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide write APIs used by the admin surface (users, posts, tags,
//!   likes, comments).
//! - Provide read APIs for listing pages with comment/like/post counts
//!   precomputed by SQL subqueries.
//!
//! # Invariants
//! - Tags for a page of posts are loaded in a single query.
//! - `set_post_tags` replaces the whole tag set in a single transaction.
//! - Tag titles are unique; lookup by title yields at most one row.

use crate::db::DbError;
use crate::model::post::{
    normalize_tag_title, normalize_username, CommentId, ModelValidationError, NewComment, NewPost,
    PostId, TagId, UserId,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const POST_SELECT_SQL: &str = "SELECT
    p.id,
    p.title,
    p.text,
    p.image,
    p.published_at,
    p.slug,
    u.username AS author,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
    (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes_count
FROM posts p
INNER JOIN users u ON u.id = p.author_id";

const TAG_SELECT_SQL: &str = "SELECT
    t.id,
    t.title,
    (SELECT COUNT(*) FROM post_tags x WHERE x.tag_id = t.id) AS posts_count
FROM tags t";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for blog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Referenced row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Unique constraint violation (slug, username, tag title).
    Conflict(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Tag read model annotated with the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub id: TagId,
    pub title: String,
    pub posts_count: u32,
}

/// Post read model with precomputed aggregates and loaded tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: PostId,
    pub title: String,
    pub text: String,
    /// Author username.
    pub author: String,
    pub image: Option<String>,
    /// Unix epoch milliseconds.
    pub published_at: i64,
    pub slug: String,
    pub comments_count: u32,
    pub likes_count: u32,
    /// Sorted by title.
    pub tags: Vec<TagRecord>,
}

/// Comment read model with author username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub text: String,
    pub author: String,
    pub published_at: i64,
}

/// Repository interface for blog reads and admin writes.
pub trait BlogRepository {
    fn create_user(&self, username: &str) -> RepoResult<UserId>;
    fn create_post(&self, post: &NewPost) -> RepoResult<PostId>;
    /// Replaces all tags of a post, creating missing tags by title.
    fn set_post_tags(&self, post_id: PostId, titles: &[String]) -> RepoResult<()>;
    /// Records a like; liking twice is a no-op.
    fn like_post(&self, post_id: PostId, user_id: UserId) -> RepoResult<()>;
    fn add_comment(&self, comment: &NewComment) -> RepoResult<CommentId>;

    /// Posts with the most likes first.
    fn popular_posts(&self, limit: u32) -> RepoResult<Vec<PostRecord>>;
    /// The `limit` most recent posts, ordered oldest to newest.
    fn fresh_posts(&self, limit: u32) -> RepoResult<Vec<PostRecord>>;
    /// Tags carried by the most posts first.
    fn popular_tags(&self, limit: u32) -> RepoResult<Vec<TagRecord>>;
    fn find_tag_by_title(&self, title: &str) -> RepoResult<Option<TagRecord>>;
    /// Posts carrying the tag, newest first.
    fn posts_with_tag(&self, tag_id: TagId, limit: u32) -> RepoResult<Vec<PostRecord>>;
    fn find_post_by_slug(&self, slug: &str) -> RepoResult<Option<PostRecord>>;
    /// Comments of a post, oldest first.
    fn comments_for_post(&self, post_id: PostId) -> RepoResult<Vec<CommentRecord>>;
}

/// SQLite-backed blog repository.
pub struct SqliteBlogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlogRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails when the blog tables are missing, e.g. on a connection that was
    /// not opened through `open_db`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["users", "posts", "tags", "post_tags", "post_likes", "comments"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    fn query_posts(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        drop(rows);

        attach_tags(self.conn, &mut posts)?;
        Ok(posts)
    }

    fn query_tags(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<TagRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }

    fn ensure_exists(&self, table: &'static str, entity: &'static str, id: i64) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
            [id],
            |row| row.get(0),
        )?;
        if exists == 1 {
            Ok(())
        } else {
            Err(RepoError::NotFound { entity, id })
        }
    }
}

impl BlogRepository for SqliteBlogRepository<'_> {
    fn create_user(&self, username: &str) -> RepoResult<UserId> {
        let username = normalize_username(username)?;
        self.conn
            .execute("INSERT INTO users (username) VALUES (?1);", [&username])
            .map_err(|err| conflict_or_db(err, format!("username `{username}` is taken")))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_post(&self, post: &NewPost) -> RepoResult<PostId> {
        post.validate()?;
        self.ensure_exists("users", "user", post.author_id)?;

        self.conn
            .execute(
                "INSERT INTO posts (title, text, author_id, image, published_at, slug)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    post.title.as_str(),
                    post.text.as_str(),
                    post.author_id,
                    post.image.as_deref(),
                    post.published_at,
                    post.slug.as_str(),
                ],
            )
            .map_err(|err| conflict_or_db(err, format!("slug `{}` is taken", post.slug)))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn set_post_tags(&self, post_id: PostId, titles: &[String]) -> RepoResult<()> {
        let titles = titles
            .iter()
            .map(|title| normalize_tag_title(title))
            .collect::<Result<Vec<_>, _>>()?;

        let tx = self.conn.unchecked_transaction()?;
        self.ensure_exists("posts", "post", post_id)?;

        tx.execute("DELETE FROM post_tags WHERE post_id = ?1;", [post_id])?;
        for title in &titles {
            tx.execute(
                "INSERT OR IGNORE INTO tags (title) VALUES (?1);",
                [title.as_str()],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, tag_id)
                 SELECT ?1, id FROM tags WHERE title = ?2;",
                params![post_id, title.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn like_post(&self, post_id: PostId, user_id: UserId) -> RepoResult<()> {
        self.ensure_exists("posts", "post", post_id)?;
        self.ensure_exists("users", "user", user_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?1, ?2);",
            params![post_id, user_id],
        )?;
        Ok(())
    }

    fn add_comment(&self, comment: &NewComment) -> RepoResult<CommentId> {
        comment.validate()?;
        self.ensure_exists("posts", "post", comment.post_id)?;
        self.ensure_exists("users", "user", comment.author_id)?;
        self.conn.execute(
            "INSERT INTO comments (post_id, author_id, text, published_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment.post_id,
                comment.author_id,
                comment.text.as_str(),
                comment.published_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn popular_posts(&self, limit: u32) -> RepoResult<Vec<PostRecord>> {
        self.query_posts(
            &format!(
                "{POST_SELECT_SQL}
                 ORDER BY likes_count DESC, p.published_at DESC, p.id ASC
                 LIMIT ?;"
            ),
            vec![Value::Integer(i64::from(limit))],
        )
    }

    fn fresh_posts(&self, limit: u32) -> RepoResult<Vec<PostRecord>> {
        let mut posts = self.query_posts(
            &format!(
                "{POST_SELECT_SQL}
                 ORDER BY p.published_at DESC, p.id DESC
                 LIMIT ?;"
            ),
            vec![Value::Integer(i64::from(limit))],
        )?;
        posts.reverse();
        Ok(posts)
    }

    fn popular_tags(&self, limit: u32) -> RepoResult<Vec<TagRecord>> {
        self.query_tags(
            &format!(
                "{TAG_SELECT_SQL}
                 ORDER BY posts_count DESC, t.title ASC
                 LIMIT ?;"
            ),
            vec![Value::Integer(i64::from(limit))],
        )
    }

    fn find_tag_by_title(&self, title: &str) -> RepoResult<Option<TagRecord>> {
        let tag = self
            .conn
            .query_row(
                &format!("{TAG_SELECT_SQL} WHERE t.title = ?1;"),
                [title],
                |row| {
                    Ok(TagRecord {
                        id: row.get("id")?,
                        title: row.get("title")?,
                        posts_count: row.get("posts_count")?,
                    })
                },
            )
            .optional()?;
        Ok(tag)
    }

    fn posts_with_tag(&self, tag_id: TagId, limit: u32) -> RepoResult<Vec<PostRecord>> {
        self.query_posts(
            &format!(
                "{POST_SELECT_SQL}
                 WHERE EXISTS (
                    SELECT 1 FROM post_tags pt
                    WHERE pt.post_id = p.id AND pt.tag_id = ?
                 )
                 ORDER BY p.published_at DESC, p.id DESC
                 LIMIT ?;"
            ),
            vec![Value::Integer(tag_id), Value::Integer(i64::from(limit))],
        )
    }

    fn find_post_by_slug(&self, slug: &str) -> RepoResult<Option<PostRecord>> {
        let posts = self.query_posts(
            &format!("{POST_SELECT_SQL} WHERE p.slug = ?;"),
            vec![Value::Text(slug.to_string())],
        )?;
        Ok(posts.into_iter().next())
    }

    fn comments_for_post(&self, post_id: PostId) -> RepoResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.text, c.published_at, u.username AS author
             FROM comments c
             INNER JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?1
             ORDER BY c.published_at ASC, c.id ASC;",
        )?;
        let mut rows = stmt.query([post_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(CommentRecord {
                id: row.get("id")?,
                text: row.get("text")?,
                author: row.get("author")?,
                published_at: row.get("published_at")?,
            });
        }
        Ok(comments)
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<PostRecord> {
    Ok(PostRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        author: row.get("author")?,
        image: row.get("image")?,
        published_at: row.get("published_at")?,
        slug: row.get("slug")?,
        comments_count: row.get("comments_count")?,
        likes_count: row.get("likes_count")?,
        tags: Vec::new(),
    })
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<TagRecord> {
    Ok(TagRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        posts_count: row.get("posts_count")?,
    })
}

/// Loads tags (with their post counts) for every post in one query.
fn attach_tags(conn: &Connection, posts: &mut [PostRecord]) -> RepoResult<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; posts.len()].join(", ");
    let sql = format!(
        "SELECT
            pt.post_id,
            t.id,
            t.title,
            (SELECT COUNT(*) FROM post_tags x WHERE x.tag_id = t.id) AS posts_count
         FROM post_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id IN ({placeholders})
         ORDER BY t.title ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(posts.iter().map(|post| post.id)))?;

    let mut by_post: HashMap<PostId, Vec<TagRecord>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let post_id: PostId = row.get("post_id")?;
        by_post.entry(post_id).or_default().push(parse_tag_row(row)?);
    }

    for post in posts.iter_mut() {
        post.tags = by_post.remove(&post.id).unwrap_or_default();
    }
    Ok(())
}

fn conflict_or_db(err: rusqlite::Error, message: String) -> RepoError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => RepoError::Conflict(message),
        _ => err.into(),
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
