//! Web front of the blog: configuration, routing and HTML pages.

pub mod config;
pub mod pages;
pub mod server;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use server::{router, serve};
pub use state::AppState;
