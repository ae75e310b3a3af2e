use crate::types::{CategoryId, UserId};

/// Database request for creating a new sticker record.
///
/// `path` must point at a blob that has already been written; the metadata
/// row is only ever inserted after a successful blob write.
#[derive(Debug, Clone)]
pub struct StickerCreateDBRequest {
    pub category_id: CategoryId,
    /// Original (sanitized) client filename
    pub name: String,
    /// Blob store path, unique per sticker
    pub path: String,
    /// Sniffed MIME type, never the client-declared one
    pub mime_type: String,
    pub uploaded_by: Option<UserId>,
}
