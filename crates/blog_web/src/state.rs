use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Shared per-process state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub media_url: Arc<str>,
}

impl AppState {
    pub fn new(conn: Connection, media_url: &str) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            media_url: Arc::from(media_url),
        }
    }
}
