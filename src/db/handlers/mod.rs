//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection, provides strongly-typed CRUD
//! operations for one table, and returns domain records. Query construction
//! and parameter binding never leak out of this module.
//!
//! - [`Categories`]: Sticker category persistence and per-owner lookups
//! - [`Stickers`]: Sticker metadata persistence, scoped to a category

pub mod categories;
pub mod repository;
pub mod stickers;

pub use categories::Categories;
pub use repository::Repository;
pub use stickers::Stickers;
