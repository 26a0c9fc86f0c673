//! HTML pages rendered from service display mappings.
//!
//! Templates are `maud` macros; every interpolated value is escaped.

use blog_core::{IndexPage, PostCard, PostDetailPage, TagCard, TagFilterPage};
use chrono::DateTime;
use maud::{html, Markup, DOCTYPE};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

const SITE_TITLE: &str = "Blog";

pub fn index(page: &IndexPage) -> Markup {
    layout(
        SITE_TITLE,
        html! {
            section.feed {
                h2 { "Fresh posts" }
                @for post in &page.page_posts {
                    (post_card(post))
                }
            }
        },
        sidebar(&page.popular_tags, &page.most_popular_posts),
    )
}

pub fn post_detail(page: &PostDetailPage) -> Markup {
    let post = &page.post;
    layout(
        &post.title,
        html! {
            article.post {
                h1 { (post.title) }
                p.meta {
                    (post.author) " · " (published(post.published_at))
                    " · " (post.likes_amount) " likes"
                }
                @if let Some(url) = &post.image_url {
                    img.cover src=(url) alt=(post.title);
                }
                (tag_links(&post.tags))
                div.text { (post.text) }
            }
            section.comments {
                h2 { "Comments (" (post.comments.len()) ")" }
                @for comment in &post.comments {
                    div.comment {
                        p.meta { (comment.author) " · " (published(comment.published_at)) }
                        p { (comment.text) }
                    }
                }
            }
        },
        sidebar(&page.popular_tags, &page.most_popular_posts),
    )
}

pub fn tag_filter(page: &TagFilterPage) -> Markup {
    layout(
        &format!("Posts tagged {}", page.tag),
        html! {
            section.feed {
                h2 { "Posts tagged «" (page.tag) "»" }
                @if page.posts.is_empty() {
                    p.empty { "No posts with this tag yet." }
                }
                @for post in &page.posts {
                    (post_card(post))
                }
            }
        },
        sidebar(&page.popular_tags, &page.most_popular_posts),
    )
}

pub fn contacts() -> Markup {
    layout(
        "Contacts",
        html! {
            section.contacts {
                h1 { "Contacts" }
                p { "Questions and feedback are welcome." }
            }
        },
        html! {},
    )
}

pub fn not_found() -> Markup {
    layout(
        "Not found",
        html! {
            h1 { "Page not found" }
            p { a href="/" { "Back to the home page" } }
        },
        html! {},
    )
}

pub fn server_error() -> Markup {
    layout(
        "Server error",
        html! {
            h1 { "Something went wrong" }
            p { "Please try again later." }
        },
        html! {},
    )
}

/// Path of the post detail page.
pub fn post_href(slug: &str) -> String {
    format!("/post/{slug}")
}

/// Path of the tag filter page; the title is percent-encoded.
pub fn tag_href(title: &str) -> String {
    format!("/tag/{}", utf8_percent_encode(title, NON_ALPHANUMERIC))
}

fn layout(title: &str, content: Markup, aside: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | " (SITE_TITLE) }
            }
            body {
                header {
                    nav {
                        a href="/" { (SITE_TITLE) }
                        " "
                        a href="/contacts" { "Contacts" }
                    }
                }
                main { (content) }
                aside { (aside) }
            }
        }
    }
}

fn sidebar(tags: &[TagCard], popular: &[PostCard]) -> Markup {
    html! {
        section.popular-tags {
            h3 { "Popular tags" }
            ul {
                @for tag in tags {
                    li { a href=(tag_href(&tag.title)) { (tag.title) } " (" (tag.posts_with_tag) ")" }
                }
            }
        }
        section.popular-posts {
            h3 { "Popular posts" }
            ul {
                @for post in popular {
                    li { a href=(post_href(&post.slug)) { (post.title) } }
                }
            }
        }
    }
}

fn post_card(post: &PostCard) -> Markup {
    html! {
        article.post-card {
            @if let Some(title) = &post.first_tag_title {
                a.first-tag href=(tag_href(title)) { (title) }
            }
            h3 { a href=(post_href(&post.slug)) { (post.title) } }
            p.meta {
                (post.author) " · " (published(post.published_at))
                " · " (post.comments_amount) " comments"
            }
            @if let Some(url) = &post.image_url {
                img src=(url) alt=(post.title);
            }
            p.teaser { (post.teaser_text) }
            (tag_links(&post.tags))
        }
    }
}

fn tag_links(tags: &[TagCard]) -> Markup {
    html! {
        @if !tags.is_empty() {
            ul.tags {
                @for tag in tags {
                    li { a href=(tag_href(&tag.title)) { "#" (tag.title) } }
                }
            }
        }
    }
}

fn published(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|at| at.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_default()
}
