//! Server configuration loaded from the environment.
//!
//! # Responsibility
//! - Read `BLOG_*` variables, after loading an optional `.env` file.
//! - Apply defaults and reject malformed values before startup.

use blog_core::default_log_level;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "blog.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_MEDIA_DIR: &str = "media";
pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// First path segments already taken by page routes.
const RESERVED_SEGMENTS: &[&str] = &["post", "tag", "contacts"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBindAddr(String),
    InvalidMediaUrl(String),
    /// Media URL would shadow a page route.
    ReservedMediaUrl(String),
    NotUnicode(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBindAddr(value) => write!(f, "BLOG_BIND_ADDR `{value}` is not host:port"),
            Self::InvalidMediaUrl(value) => {
                write!(f, "BLOG_MEDIA_URL `{value}` must start and end with `/`")
            }
            Self::ReservedMediaUrl(value) => write!(
                f,
                "BLOG_MEDIA_URL `{value}` collides with a page route ({})",
                RESERVED_SEGMENTS.join(", ")
            ),
            Self::NotUnicode(key) => write!(f, "{key} is not valid unicode"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Absolute directory for rotating log files; stderr when `None`.
    pub log_dir: Option<String>,
    pub media_dir: PathBuf,
    /// URL prefix under which `media_dir` is served, e.g. `/media/`.
    pub media_url: String,
}

impl ServerConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key))
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, env::VarError>,
    {
        let read = |key: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(key) {
                Ok(value) if value.trim().is_empty() => Ok(None),
                Ok(value) => Ok(Some(value.trim().to_string())),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key)),
            }
        };

        let bind_raw = read("BLOG_BIND_ADDR")?.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let media_url = read("BLOG_MEDIA_URL")?.unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string());
        if !media_url.starts_with('/') || !media_url.ends_with('/') || media_url == "/" {
            return Err(ConfigError::InvalidMediaUrl(media_url));
        }
        let first_segment = media_url.trim_matches('/').split('/').next().unwrap_or_default();
        if RESERVED_SEGMENTS.contains(&first_segment) {
            return Err(ConfigError::ReservedMediaUrl(media_url));
        }

        Ok(Self {
            db_path: PathBuf::from(
                read("BLOG_DB_PATH")?.unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ),
            bind_addr,
            log_level: read("BLOG_LOG_LEVEL")?
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read("BLOG_LOG_DIR")?,
            media_dir: PathBuf::from(
                read("BLOG_MEDIA_DIR")?.unwrap_or_else(|| DEFAULT_MEDIA_DIR.to_string()),
            ),
            media_url,
        })
    }
}
