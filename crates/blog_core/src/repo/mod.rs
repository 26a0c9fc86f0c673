//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define page-oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Listing queries return aggregate counts computed in SQL, never by
//!   issuing one count query per row.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod blog_repo;
