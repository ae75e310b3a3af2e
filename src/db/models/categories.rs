use crate::types::UserId;

/// Database request for creating a new sticker category.
///
/// The handler is responsible for validating the name (length, non-empty)
/// and for the duplicate pre-check before building this request.
#[derive(Debug, Clone)]
pub struct CategoryCreateDBRequest {
    pub name: String,
    pub user_id: UserId,
    pub sort_order: i32,
}
