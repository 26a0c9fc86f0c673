//! Blog domain model.
//!
//! # Responsibility
//! - Define write-side records for users, posts, tags and comments.
//! - Validate records before they reach persistence.
//!
//! # Invariants
//! - Post slugs are URL-safe and act as the public lookup key.
//! - Titles, usernames and comment bodies are never blank.

pub mod post;
