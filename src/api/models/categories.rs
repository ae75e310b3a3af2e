use crate::db::handlers::categories::Category;
use crate::types::{CategoryId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating a category
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryCreate {
    /// Category name, unique within the caller's namespace
    pub name: String,
    /// Sort position in category listings (lower first)
    #[serde(default)]
    pub order: i32,
}

/// Category object response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[schema(value_type = Uuid)]
    pub id: CategoryId,
    pub name: String,
    pub user_id: UserId,
    pub order: i32,
    /// Creation time as unix timestamp
    pub created_at: i64,
}

impl CategoryResponse {
    pub fn from_category(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            user_id: category.user_id.clone(),
            order: category.sort_order,
            created_at: category.created_at.timestamp(),
        }
    }
}
