//! Axum route handlers.
//!
//! Handlers orchestrate the repositories and the blob store: they own the
//! validation, ownership checks, and the blob-then-metadata write ordering
//! that keeps files and records consistent.

pub mod categories;
pub mod stickers;
