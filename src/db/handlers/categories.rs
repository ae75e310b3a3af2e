use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::categories::CategoryCreateDBRequest,
};
use crate::types::{CategoryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

/// Filter for listing categories
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub user_id: Option<UserId>,
}

impl CategoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Sticker category domain object
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub user_id: UserId,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

pub struct Categories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// List all categories owned by a user, ascending by sort order.
    ///
    /// Ties on sort order are broken by creation time and then id so the
    /// ordering is stable across calls.
    pub async fn list_for_owner(&mut self, user_id: &str) -> Result<Vec<Category>> {
        self.list(&CategoryFilter::new().user_id(user_id.to_string())).await
    }

    /// Look up a category by name within one owner's namespace.
    ///
    /// Used by the create path to pre-check the `(user_id, name)` uniqueness
    /// invariant; the unique index backs this up under concurrent creation.
    pub async fn find_by_name_for_owner(&mut self, name: &str, user_id: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM sticker_categories WHERE name = $1 AND user_id = $2")
            .bind(name)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(category)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Categories<'c> {
    type CreateRequest = CategoryCreateDBRequest;
    type Response = Category;
    type Id = CategoryId;
    type Filter = CategoryFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO sticker_categories (name, user_id, sort_order)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.user_id)
        .bind(request.sort_order)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(category)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM sticker_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(category)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = sqlx::QueryBuilder::new("SELECT * FROM sticker_categories WHERE 1=1");

        if let Some(user_id) = &filter.user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id);
        }

        query.push(" ORDER BY sort_order ASC, created_at ASC, id ASC");

        let categories = query.build_query_as::<Category>().fetch_all(&mut *self.db).await?;

        Ok(categories)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sticker_categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn create_request(name: &str, user_id: &str, sort_order: i32) -> CategoryCreateDBRequest {
        CategoryCreateDBRequest {
            name: name.to_string(),
            user_id: user_id.to_string(),
            sort_order,
        }
    }

    #[sqlx::test]
    async fn test_create_and_get_category(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let created = repo.create(&create_request("emoji", "alice", 0)).await.unwrap();
        assert_eq!(created.name, "emoji");
        assert_eq!(created.user_id, "alice");
        assert_eq!(created.sort_order, 0);

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().id, created.id);
    }

    #[sqlx::test]
    async fn test_find_by_name_for_owner(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        repo.create(&create_request("emoji", "alice", 0)).await.unwrap();

        let found = repo.find_by_name_for_owner("emoji", "alice").await.unwrap();
        assert!(found.is_some());

        // Same name, different owner
        let missing = repo.find_by_name_for_owner("emoji", "bob").await.unwrap();
        assert!(missing.is_none());

        // Different name, same owner
        let missing = repo.find_by_name_for_owner("memes", "alice").await.unwrap();
        assert!(missing.is_none());
    }

    #[sqlx::test]
    async fn test_duplicate_name_hits_unique_constraint(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        repo.create(&create_request("emoji", "alice", 0)).await.unwrap();

        // A racing insert that skipped the pre-check must still be rejected
        let err = repo.create(&create_request("emoji", "alice", 5)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // The same name is fine in another owner's namespace
        let other = repo.create(&create_request("emoji", "bob", 0)).await.unwrap();
        assert_eq!(other.user_id, "bob");
    }

    #[sqlx::test]
    async fn test_list_for_owner_ordering_and_isolation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        repo.create(&create_request("last", "alice", 10)).await.unwrap();
        repo.create(&create_request("first", "alice", 0)).await.unwrap();
        repo.create(&create_request("middle", "alice", 5)).await.unwrap();
        repo.create(&create_request("other", "bob", 0)).await.unwrap();

        let categories = repo.list_for_owner("alice").await.unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "middle", "last"]);
        assert!(categories.iter().all(|c| c.user_id == "alice"));

        let empty = repo.list_for_owner("carol").await.unwrap();
        assert!(empty.is_empty());
    }
}
