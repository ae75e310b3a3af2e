use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::stickers::StickerCreateDBRequest,
};
use crate::types::{CategoryId, StickerId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

/// Filter for listing stickers
#[derive(Debug, Clone, Default)]
pub struct StickerFilter {
    pub category_id: Option<CategoryId>,
}

impl StickerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category_id(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Sticker domain object
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sticker {
    pub id: StickerId,
    pub category_id: CategoryId,
    /// Original client filename
    pub name: String,
    /// Blob store path; unique, owned exclusively by this record
    pub path: String,
    pub mime_type: String,
    pub uploaded_by: Option<UserId>,
    pub uploaded_at: DateTime<Utc>,
}

pub struct Stickers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Stickers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// List stickers in a category in insertion order.
    pub async fn list_by_category(&mut self, category_id: CategoryId) -> Result<Vec<Sticker>> {
        self.list(&StickerFilter::new().category_id(category_id)).await
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Stickers<'c> {
    type CreateRequest = StickerCreateDBRequest;
    type Response = Sticker;
    type Id = StickerId;
    type Filter = StickerFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let sticker = sqlx::query_as::<_, Sticker>(
            r#"
            INSERT INTO stickers (category_id, name, path, mime_type, uploaded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.path)
        .bind(&request.mime_type)
        .bind(&request.uploaded_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(sticker)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sticker = sqlx::query_as::<_, Sticker>("SELECT * FROM stickers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(sticker)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = sqlx::QueryBuilder::new("SELECT * FROM stickers WHERE 1=1");

        if let Some(category_id) = filter.category_id {
            query.push(" AND category_id = ");
            query.push_bind(category_id);
        }

        // Insertion order: uploaded_at with id as the stable tie-breaker
        query.push(" ORDER BY uploaded_at ASC, id ASC");

        let stickers = query.build_query_as::<Sticker>().fetch_all(&mut *self.db).await?;

        Ok(stickers)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stickers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
