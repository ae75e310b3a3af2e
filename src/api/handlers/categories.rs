use crate::api::models::categories::{CategoryCreate, CategoryResponse};
use crate::auth::CurrentUser;
use crate::db::handlers::{Categories, Repository};
use crate::db::models::categories::CategoryCreateDBRequest;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// Maximum length of a category name, matching the column width
const MAX_CATEGORY_NAME_CHARS: usize = 64;

fn validate_category_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::BadRequest {
            message: "Category name must not be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_CATEGORY_NAME_CHARS {
        return Err(Error::BadRequest {
            message: format!("Category name must be at most {MAX_CATEGORY_NAME_CHARS} characters"),
        });
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/sticker/categories",
    tag = "categories",
    summary = "List categories",
    description = "Returns the caller's sticker categories, ordered by sort position.",
    responses(
        (status = 200, description = "List of categories", body = Vec<CategoryResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_categories(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut conn);

    let categories = repo.list_for_owner(&current_user.id).await?;

    Ok(Json(categories.iter().map(CategoryResponse::from_category).collect()))
}

#[utoipa::path(
    post,
    path = "/sticker/categories",
    tag = "categories",
    summary = "Create category",
    description = "Create a sticker category owned by the caller. Names are unique per user.",
    request_body = CategoryCreate,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid category name"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Category already exists")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    validate_category_name(&body.name)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Categories::new(&mut tx);

    // Pre-check the per-owner uniqueness invariant. A concurrent create can
    // still race past this; the unique index catches it and the error layer
    // maps the violation to 409 as well.
    if repo.find_by_name_for_owner(&body.name, &current_user.id).await?.is_some() {
        return Err(Error::Conflict {
            message: "Category already exists".to_string(),
        });
    }

    let category = repo
        .create(&CategoryCreateDBRequest {
            name: body.name,
            user_id: current_user.id,
            sort_order: body.order,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    tracing::info!(category_id = %category.id, "Created sticker category");

    Ok((StatusCode::CREATED, Json(CategoryResponse::from_category(&category))))
}
