//! Page-level use-case services.
//!
//! # Responsibility
//! - Compose repository queries into the data each page renders.
//! - Convert read models into display mappings for templates.

pub mod blog_service;
pub mod serialize;
