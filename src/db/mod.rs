//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL,
//! following the repository pattern: each table has a repository struct that
//! encapsulates query construction and parameter binding and returns domain
//! records from [`handlers`].
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Create-request structures handed to repositories
//! - [`errors`]: Database-specific error types
//!
//! Repositories wrap a `&mut PgConnection`, so they compose with either a
//! pool-acquired connection (read paths) or a transaction (write paths that
//! span multiple statements):
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Categories::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//! ```
//!
//! Migrations live in the `migrations/` directory and are embedded via
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
