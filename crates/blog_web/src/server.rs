//! HTTP routing and page handlers.
//!
//! # Responsibility
//! - Map page routes onto `BlogService` use-cases.
//! - Run storage work on the blocking pool, one request at a time per
//!   connection.
//! - Translate service errors into 404/500 pages.

use crate::config::ServerConfig;
use crate::pages;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use blog_core::db::open_db;
use blog_core::{BlogService, ServiceError, SqliteBlogRepository};
use log::{error, info, warn};
use maud::Markup;
use rusqlite::Connection;
use std::path::Path as FsPath;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

/// Failure of a page handler.
#[derive(Debug)]
pub enum PageError {
    NotFound,
    Internal(String),
}

impl From<ServiceError> for PageError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::PostNotFound(_) | ServiceError::TagNotFound(_) => Self::NotFound,
            ServiceError::Repo(err) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, pages::not_found()).into_response(),
            Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, pages::server_error()).into_response()
            }
        }
    }
}

/// Builds the page router; images under `media_dir` are served at the
/// state's media URL.
pub fn router(state: AppState, media_dir: impl AsRef<FsPath>) -> Router {
    let media_route = state.media_url.trim_end_matches('/').to_string();
    Router::new()
        .route("/", get(index))
        .route("/post/:slug", get(post_detail))
        .route("/tag/:tag_title", get(tag_filter))
        .route("/contacts", get(contacts))
        .nest_service(&media_route, ServeDir::new(media_dir.as_ref()))
        .fallback(fallback)
        .with_state(state)
}

/// Opens the database and serves pages until the process is stopped.
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(&config.db_path)?;
    let state = AppState::new(conn, &config.media_url);
    let app = router(state, &config.media_dir);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=web status=ok addr={} db_path={}",
        listener.local_addr()?,
        config.db_path.display()
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Response {
    render(state, "index", |service| {
        Ok(pages::index(&service.index_page()?))
    })
    .await
}

async fn post_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    render(state, "post_detail", move |service| {
        Ok(pages::post_detail(&service.post_detail_page(&slug)?))
    })
    .await
}

async fn tag_filter(State(state): State<AppState>, Path(tag_title): Path<String>) -> Response {
    render(state, "tag_filter", move |service| {
        Ok(pages::tag_filter(&service.tag_filter_page(&tag_title)?))
    })
    .await
}

async fn contacts() -> Markup {
    pages::contacts()
}

async fn fallback() -> PageError {
    PageError::NotFound
}

/// Runs `build` against a service bound to the shared connection and turns
/// the outcome into a response.
async fn render<F>(state: AppState, page: &'static str, build: F) -> Response
where
    F: FnOnce(&BlogService<SqliteBlogRepository<'_>>) -> Result<Markup, PageError>
        + Send
        + 'static,
{
    let started_at = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        let conn = lock_connection(&state.conn);
        let repo = SqliteBlogRepository::try_new(&conn)
            .map_err(|err| PageError::Internal(err.to_string()))?;
        let service = BlogService::with_media_url(repo, state.media_url.as_ref());
        build(&service)
    })
    .await
    .unwrap_or_else(|err| Err(PageError::Internal(format!("page task failed: {err}"))));

    let duration_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(markup) => {
            info!("event=page_render module=web status=ok page={page} duration_ms={duration_ms}");
            markup.into_response()
        }
        Err(PageError::NotFound) => {
            warn!("event=page_render module=web status=not_found page={page} duration_ms={duration_ms}");
            PageError::NotFound.into_response()
        }
        Err(PageError::Internal(message)) => {
            error!(
                "event=page_render module=web status=error page={page} duration_ms={duration_ms} error={message}"
            );
            PageError::Internal(message).into_response()
        }
    }
}

/// Locks the shared connection, recovering it after a panicked page build.
///
/// SQLite keeps its state consistent per statement and page builds only
/// read, so a poisoned guard is still safe to use.
fn lock_connection(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        error!("event=db_lock module=web status=recovered reason=mutex_poisoned");
        conn.clear_poison();
        poisoned.into_inner()
    })
}
