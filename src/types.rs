//! Common type definitions.
//!
//! Entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`CategoryId`]: Sticker category identifier
//! - [`StickerId`]: Sticker identifier
//!
//! User identities are opaque strings handed to us by the authenticating
//! reverse proxy; we never parse or interpret them beyond equality checks.

use uuid::Uuid;

// Type aliases for IDs
pub type CategoryId = Uuid;
pub type StickerId = Uuid;

/// Opaque identifier of an authenticated user.
pub type UserId = String;
