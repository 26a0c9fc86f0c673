mod common;

use blog_core::db::open_db_in_memory;
use blog_core::{
    BlogRepository, ModelValidationError, NewComment, NewPost, RepoError, SqliteBlogRepository,
};
use common::{comments, likes, post, user};

#[test]
fn create_post_rejects_duplicate_slug() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    post(&repo, alice, "hello", 1, &[]);

    let err = repo
        .create_post(&NewPost::new(alice, "hello", "Again", "body", 2))
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn create_post_validates_slug_and_author() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();

    let err = repo
        .create_post(&NewPost::new(1, "not a slug", "Title", "body", 0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::InvalidSlug(_))
    ));

    let err = repo
        .create_post(&NewPost::new(42, "slug", "Title", "body", 0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "user",
            id: 42
        }
    ));
}

#[test]
fn create_user_rejects_taken_username() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    user(&repo, "alice");
    assert!(matches!(
        repo.create_user(" alice "),
        Err(RepoError::Conflict(_))
    ));
}

#[test]
fn set_post_tags_replaces_full_set() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    post(&repo, alice, "tagged", 1, &["rust", "web", "rust"]);

    let loaded = repo.find_post_by_slug("tagged").unwrap().unwrap();
    let titles: Vec<&str> = loaded.tags.iter().map(|tag| tag.title.as_str()).collect();
    assert_eq!(titles, vec!["rust", "web"]);

    repo.set_post_tags(loaded.id, &["go".to_string()]).unwrap();
    let reloaded = repo.find_post_by_slug("tagged").unwrap().unwrap();
    assert_eq!(reloaded.tags.len(), 1);
    assert_eq!(reloaded.tags[0].title, "go");
}

#[test]
fn set_post_tags_rejects_blank_title_without_touching_existing_tags() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    let id = post(&repo, alice, "tagged", 1, &["rust"]);

    let err = repo
        .set_post_tags(id, &["ok".to_string(), "  ".to_string()])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankTagTitle)
    ));
    let loaded = repo.find_post_by_slug("tagged").unwrap().unwrap();
    assert_eq!(loaded.tags[0].title, "rust");
}

#[test]
fn like_post_twice_counts_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    let bob = user(&repo, "bob");
    let id = post(&repo, alice, "liked", 1, &[]);

    repo.like_post(id, bob).unwrap();
    repo.like_post(id, bob).unwrap();
    repo.like_post(id, alice).unwrap();

    let loaded = repo.find_post_by_slug("liked").unwrap().unwrap();
    assert_eq!(loaded.likes_count, 2);
}

#[test]
fn comment_count_matches_comment_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    let first = post(&repo, alice, "first", 1, &["rust"]);
    let second = post(&repo, alice, "second", 2, &["rust"]);
    comments(&repo, first, alice, 3);
    comments(&repo, second, alice, 1);
    likes(&repo, first, 2);

    for listed in repo.popular_posts(5).unwrap() {
        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM comments WHERE post_id = ?1;",
                [listed.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(i64::from(listed.comments_count), rows);
    }
}

#[test]
fn popular_posts_are_ordered_by_likes_and_capped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    for (idx, amount) in [0usize, 4, 1, 6, 2, 3, 5].into_iter().enumerate() {
        let id = post(&repo, alice, &format!("post-{idx}"), idx as i64, &[]);
        likes(&repo, id, amount);
    }

    let popular = repo.popular_posts(5).unwrap();
    let counts: Vec<u32> = popular.iter().map(|post| post.likes_count).collect();
    assert_eq!(counts, vec![6, 5, 4, 3, 2]);
}

#[test]
fn fresh_posts_are_latest_in_ascending_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    for hour in [5, 1, 7, 3, 2, 6, 4] {
        post(&repo, alice, &format!("hour-{hour}"), hour, &[]);
    }

    let fresh = repo.fresh_posts(5).unwrap();
    let slugs: Vec<&str> = fresh.iter().map(|post| post.slug.as_str()).collect();
    assert_eq!(slugs, vec!["hour-3", "hour-4", "hour-5", "hour-6", "hour-7"]);
}

#[test]
fn popular_tags_are_non_increasing_in_post_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    post(&repo, alice, "a", 1, &["rust", "web", "db"]);
    post(&repo, alice, "b", 2, &["rust", "web"]);
    post(&repo, alice, "c", 3, &["rust", "cli"]);
    post(&repo, alice, "d", 4, &["misc", "other", "extra"]);

    let tags = repo.popular_tags(5).unwrap();
    assert_eq!(tags.len(), 5);
    assert_eq!(tags[0].title, "rust");
    assert_eq!(tags[0].posts_count, 3);
    assert_eq!(tags[1].title, "web");
    assert!(tags
        .windows(2)
        .all(|pair| pair[0].posts_count >= pair[1].posts_count));
}

#[test]
fn posts_with_tag_are_capped_and_carry_counts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    for idx in 0..25 {
        post(&repo, alice, &format!("p{idx}"), idx, &["rust"]);
    }
    post(&repo, alice, "other", 100, &["go"]);

    let tag = repo.find_tag_by_title("rust").unwrap().unwrap();
    assert_eq!(tag.posts_count, 25);
    let posts = repo.posts_with_tag(tag.id, 20).unwrap();
    assert_eq!(posts.len(), 20);
    assert_eq!(posts[0].slug, "p24");
    assert!(posts
        .iter()
        .all(|post| post.tags.iter().any(|tag| tag.title == "rust" && tag.posts_count == 25)));
}

#[test]
fn find_tag_by_title_is_exact() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    post(&repo, alice, "a", 1, &["Rust"]);

    assert!(repo.find_tag_by_title("Rust").unwrap().is_some());
    assert!(repo.find_tag_by_title("rust").unwrap().is_none());
}

#[test]
fn comments_for_post_are_oldest_first_with_authors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    let bob = user(&repo, "bob");
    let id = post(&repo, alice, "a", 1, &[]);
    repo.add_comment(&NewComment {
        post_id: id,
        author_id: bob,
        text: "later".to_string(),
        published_at: 20,
    })
    .unwrap();
    repo.add_comment(&NewComment {
        post_id: id,
        author_id: alice,
        text: "earlier".to_string(),
        published_at: 10,
    })
    .unwrap();

    let listed = repo.comments_for_post(id).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].text, "earlier");
    assert_eq!(listed[0].author, "alice");
    assert_eq!(listed[1].author, "bob");
}

#[test]
fn add_comment_rejects_blank_text() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBlogRepository::try_new(&conn).unwrap();
    let alice = user(&repo, "alice");
    let id = post(&repo, alice, "a", 1, &[]);

    let err = repo
        .add_comment(&NewComment {
            post_id: id,
            author_id: alice,
            text: "  ".to_string(),
            published_at: 0,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankCommentText)
    ));
}
